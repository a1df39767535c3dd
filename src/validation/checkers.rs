use super::{RuleChecker, RuleContext};
use crate::condition::{
    compile_pattern, format_number, lookup, strict_equals, to_display_string, to_number,
};
use crate::form::ValidationRule;
use ahash::AHashMap;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^(https?|ftp)://[^\s/$.?#][^\s]*$")
        .case_insensitive(true)
        .build()
        .expect("url regex")
});
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s\-().]{7,20}$").expect("phone regex"));

/// Master macro to define the built-in checkers, their registration, and their creation.
macro_rules! define_rule_checkers {
    ( $( ($struct_name:ident, $rule_type:literal, $check_fn:ident) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl RuleChecker for $struct_name {
                fn rule_type(&self) -> &str { $rule_type }
                fn check(&self, value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
                    $check_fn(value, rule, ctx)
                }
            }
        )*

        pub(super) fn register_default_checkers(registry: &mut AHashMap<String, Box<dyn RuleChecker>>) {
            $( registry.insert($rule_type.to_string(), Box::new($struct_name)); )*
        }

        pub(super) fn create_checker_by_name(name: &str) -> Option<Box<dyn RuleChecker>> {
            match name {
                $( $rule_type => Some(Box::new($struct_name)), )*
                _ => None,
            }
        }
    };
}

define_rule_checkers! {
    (MinLengthChecker, "minLength", check_min_length),
    (MaxLengthChecker, "maxLength", check_max_length),
    (PatternChecker, "pattern", check_pattern),
    (MinChecker, "min", check_min),
    (MaxChecker, "max", check_max),
    (EmailChecker, "email", check_email),
    (UrlChecker, "url", check_url),
    (PhoneChecker, "phone", check_phone),
    (MinSelectionsChecker, "minSelections", check_min_selections),
    (MaxSelectionsChecker, "maxSelections", check_max_selections),
    (FileSizeChecker, "fileSize", check_file_size),
    (FileTypeChecker, "fileType", check_file_type),
    (MatchesFieldChecker, "matchesField", check_matches_field),
    (CustomChecker, "custom", check_custom),
}

fn limit(rule: &ValidationRule) -> Option<f64> {
    to_number(&rule.value)
}

// --- Text ---

fn check_min_length(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let (Value::String(text), Some(min)) = (value, limit(rule)) else {
        return None;
    };
    ((text.chars().count() as f64) < min).then(|| {
        ctx.message(rule, || {
            format!("{} must be at least {} characters", ctx.label(), format_number(min))
        })
    })
}

fn check_max_length(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let (Value::String(text), Some(max)) = (value, limit(rule)) else {
        return None;
    };
    ((text.chars().count() as f64) > max).then(|| {
        ctx.message(rule, || {
            format!("{} must be no more than {} characters", ctx.label(), format_number(max))
        })
    })
}

fn check_pattern(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let pattern = rule.value.as_str()?;
    let regex = match compile_pattern(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            tracing::warn!(field = %ctx.field.name, pattern, "invalid validation pattern: {}", e);
            return None;
        }
    };
    (!regex.is_match(&to_display_string(value)))
        .then(|| ctx.message(rule, || format!("{} format is invalid", ctx.label())))
}

fn check_email(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let text = value.as_str()?;
    (!EMAIL_RE.is_match(text.trim()))
        .then(|| ctx.message(rule, || format!("{} must be a valid email address", ctx.label())))
}

fn check_url(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let text = value.as_str()?;
    (!URL_RE.is_match(text.trim()))
        .then(|| ctx.message(rule, || format!("{} must be a valid URL", ctx.label())))
}

fn check_phone(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let text = to_display_string(value);
    let digits = text.chars().filter(char::is_ascii_digit).count();
    (!PHONE_RE.is_match(text.trim()) || digits < 7)
        .then(|| ctx.message(rule, || format!("{} must be a valid phone number", ctx.label())))
}

// --- Numeric ---

fn check_min(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let (number, min) = (to_number(value)?, limit(rule)?);
    (number < min).then(|| {
        ctx.message(rule, || format!("{} must be at least {}", ctx.label(), format_number(min)))
    })
}

fn check_max(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let (number, max) = (to_number(value)?, limit(rule)?);
    (number > max).then(|| {
        ctx.message(rule, || {
            format!("{} must be no more than {}", ctx.label(), format_number(max))
        })
    })
}

// --- Selections ---

fn check_min_selections(
    value: &Value,
    rule: &ValidationRule,
    ctx: &RuleContext<'_>,
) -> Option<String> {
    let (Value::Array(items), Some(min)) = (value, limit(rule)) else {
        return None;
    };
    ((items.len() as f64) < min).then(|| {
        ctx.message(rule, || {
            format!("Please select at least {} options for {}", format_number(min), ctx.label())
        })
    })
}

fn check_max_selections(
    value: &Value,
    rule: &ValidationRule,
    ctx: &RuleContext<'_>,
) -> Option<String> {
    let (Value::Array(items), Some(max)) = (value, limit(rule)) else {
        return None;
    };
    ((items.len() as f64) > max).then(|| {
        ctx.message(rule, || {
            format!("Please select no more than {} options for {}", format_number(max), ctx.label())
        })
    })
}

// --- Files ---

/// File values are `{name, size, type}` objects, alone or in a list.
fn file_entries(value: &Value) -> Vec<&serde_json::Map<String, Value>> {
    match value {
        Value::Object(file) => vec![file],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];
    let mut size = bytes;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{} {}", format_number((size * 100.0).round() / 100.0), UNITS[unit])
}

fn check_file_size(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let max = limit(rule)?;
    let too_large = file_entries(value)
        .into_iter()
        .any(|file| file.get("size").and_then(to_number).is_some_and(|size| size > max));
    too_large.then(|| {
        ctx.message(rule, || {
            format!("{} must be smaller than {}", ctx.label(), format_bytes(max))
        })
    })
}

fn accepts(accepted: &str, name: &str, mime: &str) -> bool {
    let accepted = accepted.trim().to_lowercase();
    if let Some(prefix) = accepted.strip_suffix("/*") {
        return mime.starts_with(&format!("{}/", prefix));
    }
    if accepted.contains('/') {
        return mime == accepted;
    }
    let extension = accepted.trim_start_matches('.');
    name.ends_with(&format!(".{}", extension))
}

fn check_file_type(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let Value::Array(accepted) = &rule.value else {
        return None;
    };
    let accepted: Vec<&str> = accepted.iter().filter_map(Value::as_str).collect();
    let rejected = file_entries(value).into_iter().any(|file| {
        let name = file.get("name").and_then(Value::as_str).unwrap_or("").to_lowercase();
        let mime = file.get("type").and_then(Value::as_str).unwrap_or("").to_lowercase();
        !accepted.iter().any(|a| accepts(a, &name, &mime))
    });
    rejected.then(|| {
        ctx.message(rule, || {
            format!("{} must be one of: {}", ctx.label(), accepted.iter().join(", "))
        })
    })
}

// --- Cross-field and user-defined ---

fn check_matches_field(
    value: &Value,
    rule: &ValidationRule,
    ctx: &RuleContext<'_>,
) -> Option<String> {
    let other = rule.value.as_str()?;
    (!strict_equals(value, lookup(ctx.data, other)))
        .then(|| ctx.message(rule, || format!("{} must match {}", ctx.label(), other)))
}

fn check_custom(value: &Value, rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
    let name = rule.value.as_str()?;
    match ctx.custom_validator(name) {
        Some(validator) => validator(value, ctx).map(|message| rule.message.clone().unwrap_or(message)),
        None => {
            tracing::warn!(field = %ctx.field.name, validator = name, "custom validator not registered");
            None
        }
    }
}
