// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native modules shipped with the interpreter
//!
//! - `sys`: version, platform and module search path
//! - `text`: string helpers

use keystone_modules::{Exports, NativeFunction, NativeModules, SearchPath, Value};

/// The default native module registry
pub fn native_modules(search_path: &SearchPath) -> NativeModules {
    let dirs: Vec<Value> = search_path
        .iter()
        .map(|dir| Value::String(dir.display().to_string()))
        .collect();

    NativeModules::new()
        .with("sys", move || Ok(sys_module(dirs.clone())))
        .with("text", || Ok(text_module()))
}

/// Create the sys module exports
fn sys_module(search_path: Vec<Value>) -> Exports {
    let exports = Exports::new();
    exports.set("version", env!("CARGO_PKG_VERSION"));
    exports.set("platform", std::env::consts::OS);
    exports.set("arch", std::env::consts::ARCH);
    exports.set("path", Value::List(search_path));
    exports
}

/// Create the text module exports
fn text_module() -> Exports {
    let exports = Exports::new();

    exports.set(
        "upper",
        NativeFunction::new("upper", |args| {
            Ok(Value::String(string_arg("upper", args, 0)?.to_uppercase()))
        }),
    );
    exports.set(
        "lower",
        NativeFunction::new("lower", |args| {
            Ok(Value::String(string_arg("lower", args, 0)?.to_lowercase()))
        }),
    );
    exports.set(
        "concat",
        NativeFunction::new("concat", |args| {
            Ok(Value::String(
                args.iter().map(ToString::to_string).collect::<String>(),
            ))
        }),
    );
    exports.set(
        "len",
        NativeFunction::new("len", |args| match args.first() {
            Some(Value::String(s)) => Ok(Value::Number(s.chars().count() as f64)),
            Some(Value::List(items)) => Ok(Value::Number(items.len() as f64)),
            Some(Value::Module(exports)) => Ok(Value::Number(exports.len() as f64)),
            Some(other) => Err(format!("len() does not apply to {}", other.type_name())),
            None => Err("len() expects 1 argument".to_string()),
        }),
    );

    exports
}

fn string_arg<'v>(function: &str, args: &'v [Value], index: usize) -> Result<&'v str, String> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(format!(
            "{}() expects a string, got {}",
            function,
            other.type_name()
        )),
        None => Err(format!("{}() expects a string argument", function)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_modules::NativeRegistry;

    fn call(exports: &Exports, name: &str, args: &[Value]) -> Result<Value, String> {
        match exports.get(name) {
            Some(Value::Function(f)) => f.call(args),
            other => panic!("{} is not a function: {:?}", name, other),
        }
    }

    #[test]
    fn test_registry_names() {
        let registry = native_modules(&SearchPath::new());
        assert_eq!(registry.names(), vec!["sys".to_string(), "text".to_string()]);
    }

    #[test]
    fn test_sys_reports_search_path() {
        let registry = native_modules(&SearchPath::from_dirs(["/opt/modules"]));
        let sys = registry.load("sys").unwrap();
        assert_eq!(sys.get("platform"), Some(Value::from(std::env::consts::OS)));
        assert_eq!(
            sys.get("path"),
            Some(Value::List(vec![Value::from("/opt/modules")]))
        );
    }

    #[test]
    fn test_text_functions() {
        let text = text_module();
        assert_eq!(call(&text, "upper", &[Value::from("abc")]), Ok(Value::from("ABC")));
        assert_eq!(call(&text, "lower", &[Value::from("ABC")]), Ok(Value::from("abc")));
        assert_eq!(
            call(&text, "concat", &[Value::from("a"), Value::Number(1.0), Value::Bool(true)]),
            Ok(Value::from("a1true"))
        );
        assert_eq!(call(&text, "len", &[Value::from("h\u{e9}llo")]), Ok(Value::Number(5.0)));
        assert!(call(&text, "upper", &[Value::Number(1.0)]).is_err());
    }
}
