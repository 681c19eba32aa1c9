//! Built-in case conversion filters available to every compiled view.

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use minijinja::Environment;

pub(crate) fn register(env: &mut Environment<'static>) {
    env.add_filter("snake_case", snake_case);
    env.add_filter("pascal_case", pascal_case);
    env.add_filter("camel_case", camel_case);
    env.add_filter("kebab_case", kebab_case);
}

pub(crate) fn snake_case(value: &str) -> String {
    value.to_snake_case()
}

pub(crate) fn pascal_case(value: &str) -> String {
    value.to_pascal_case()
}

pub(crate) fn camel_case(value: &str) -> String {
    value.to_lower_camel_case()
}

pub(crate) fn kebab_case(value: &str) -> String {
    value.to_kebab_case()
}
