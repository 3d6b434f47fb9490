use std::collections::HashMap;

use heck::{ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use tera::{Result as TeraResult, Tera, Value};

/// カスタムフィルタを Tera に登録する。
pub fn register_filters(tera: &mut Tera) {
    tera.register_filter("pascal_case", pascal_case);
    tera.register_filter("snake_case", snake_case);
    tera.register_filter("camel_case", camel_case);
}

/// `{{ value | pascal_case }}` : `my_app` -> `MyApp`
fn pascal_case(value: &Value, _args: &HashMap<String, Value>) -> TeraResult<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("pascal_case は文字列にのみ適用できます"))?;
    Ok(Value::String(s.to_pascal_case()))
}

/// `{{ value | snake_case }}` : `MyApp` -> `my_app`
fn snake_case(value: &Value, _args: &HashMap<String, Value>) -> TeraResult<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("snake_case は文字列にのみ適用できます"))?;
    Ok(Value::String(s.to_snake_case()))
}

/// `{{ value | camel_case }}` : `my_app` -> `myApp`
fn camel_case(value: &Value, _args: &HashMap<String, Value>) -> TeraResult<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("camel_case は文字列にのみ適用できます"))?;
    Ok(Value::String(s.to_lower_camel_case()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(template: &str, name: &str) -> String {
        let mut tera = Tera::default();
        register_filters(&mut tera);
        tera.add_raw_template("t", template).unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("name", name);
        tera.render("t", &ctx).unwrap()
    }

    #[test]
    fn test_pascal_case_filter() {
        assert_eq!(render("{{ name | pascal_case }}", "my_app"), "MyApp");
    }

    #[test]
    fn test_snake_case_filter() {
        assert_eq!(render("{{ name | snake_case }}", "MyApp"), "my_app");
    }

    #[test]
    fn test_camel_case_filter() {
        assert_eq!(render("{{ name | camel_case }}", "my_app"), "myApp");
    }

    #[test]
    fn test_filter_rejects_non_string() {
        let mut tera = Tera::default();
        register_filters(&mut tera);
        tera.add_raw_template("t", "{{ name | pascal_case }}").unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("name", &42);
        assert!(tera.render("t", &ctx).is_err());
    }
}
