use hyprforge_installer::stages::stage_07_desktop::ZSHRC;
use hyprforge_installer::template::{Escape, Template, TemplateError};

const ENTRY: Template = Template::new(
    "entry",
    "user={{user}}\nhome=/home/{{user}}\nhost={{host}}\n",
    &["user", "host"],
);

#[test]
fn each_placeholder_replaced_and_other_text_unchanged() {
    let out = ENTRY
        .render(&[("user", "ada"), ("host", "forge")], Escape::Raw)
        .unwrap();
    assert_eq!(out, "user=ada\nhome=/home/ada\nhost=forge\n");
}

#[test]
fn values_are_never_re_expanded() {
    let out = ENTRY
        .render(&[("user", "{{host}}"), ("host", "forge")], Escape::Raw)
        .unwrap();
    assert_eq!(out, "user={{host}}\nhome=/home/{{host}}\nhost=forge\n");
}

#[test]
fn shell_escaping_neutralises_metacharacters() {
    let tpl = Template::new("sh", "echo {{v}}\n", &["v"]);
    let out = tpl
        .render(&[("v", "a'b; rm -rf / $(id)")], Escape::Shell)
        .unwrap();
    assert_eq!(out, "echo 'a'\\''b; rm -rf / $(id)'\n");
}

#[test]
fn missing_value_is_an_error() {
    let err = ENTRY.render(&[("user", "ada")], Escape::Raw).unwrap_err();
    assert_eq!(
        err,
        TemplateError::MissingValue {
            template: "entry".to_string(),
            name: "host".to_string()
        }
    );
}

#[test]
fn undeclared_placeholder_is_an_error() {
    let tpl = Template::new("t", "{{a}} {{b}}", &["a"]);
    let err = tpl.render(&[("a", "x")], Escape::Raw).unwrap_err();
    assert!(matches!(err, TemplateError::Undeclared { name, .. } if name == "b"));
}

#[test]
fn unknown_value_is_an_error() {
    let err = ENTRY
        .render(&[("user", "a"), ("host", "b"), ("extra", "c")], Escape::Raw)
        .unwrap_err();
    assert!(matches!(err, TemplateError::UnknownValue { name, .. } if name == "extra"));
}

#[test]
fn zshrc_has_only_username_placeholder() {
    let out = ZSHRC.render(&[("username", "ada")], Escape::Shell).unwrap();
    assert!(!out.contains("{{"));
    assert_eq!(out.matches("'ada'").count(), 1);
    assert!(out.contains("source \"$ZSH/oh-my-zsh.sh\""));
}
