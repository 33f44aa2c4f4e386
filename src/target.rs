//! Names of generated rules and synthesized dependency targets.
//!
//! Every place that needs a rule name or a target string goes through these
//! functions so module indexing, import resolution and rule generation agree.

use crate::rule::Label;

/// Name of the module rule emitted in a `cue.mod` directory.
pub const MODULE_RULE_NAME: &str = "cue.mod";

/// Directory name marking a module root.
pub const MODULE_DIR_NAME: &str = "cue.mod";

pub fn instance_name(package: &str) -> String {
    format!("{}_instance", package)
}

pub fn exported_instance_name(instance: &str) -> String {
    format!("{}_exported", instance)
}

pub fn consolidated_name(package: &str) -> String {
    format!("{}_def", package)
}

pub fn exported_files_name(stem: &str) -> String {
    format!("{}_exported_files", stem)
}

/// The test macro appends `_test` to this name.
pub fn test_name(instance: &str) -> String {
    format!("{}_cue", instance)
}

pub fn golden_rule_name(file_name: &str) -> String {
    format!("golden_{}", file_name)
}

/// Label of the module rule living in the `cue.mod` directory `rel`.
pub fn module_label(rel: &str) -> String {
    format!("//{}:{}", rel, MODULE_RULE_NAME)
}

/// `//x/cue.mod:cue.mod` becomes `//x/cue.mod`.
pub fn module_path(module_label: &str) -> &str {
    match module_label.rfind(':') {
        Some(idx) => &module_label[..idx],
        None => module_label,
    }
}

/// Target of a package indexed under a module root:
/// `<module path>/<subdir>/<import path>:<package>_instance`.
pub fn module_instance_target(
    module_label: &str,
    subdir: &str,
    import_path: &str,
    package: &str,
) -> String {
    format!(
        "{}/{}/{}:{}",
        module_path(module_label),
        subdir,
        import_path,
        instance_name(package)
    )
}

/// Target of an instance in an external repository: `<repo>//<path>:<package>_instance`.
pub fn repository_target(repo: &str, path: &str, package: &str) -> String {
    Label::new(repo, path, instance_name(package)).to_string()
}

/// Lossy lower-snake-case slug of a file name without its extension:
/// `My-Config.v2.cue` becomes `my_config_v_2`.
pub fn export_slug(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(idx) => &file_name[..idx],
        None => file_name,
    };
    to_snake(stem)
}

fn to_snake(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if i > 0 && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let boundary = (c.is_uppercase() && (prev.is_lowercase() || prev.is_numeric()))
                || (c.is_uppercase()
                    && prev.is_uppercase()
                    && next.map(|n| n.is_lowercase()).unwrap_or(false))
                || (c.is_numeric() && prev.is_alphabetic())
                || (c.is_alphabetic() && prev.is_numeric());
            if boundary {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out.trim_end_matches('_').to_string()
}
