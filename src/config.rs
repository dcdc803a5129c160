// ABOUTME: Version info, REPL banner strings, and module resolution defaults

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "Thyddle Interpreter";
pub const WELCOME_SUBTITLE: &str = "a small dynamically-typed scripting language";
pub const WELCOME_FOOTER: &str = "Type exit() or press Ctrl-D to leave.";

/// Extension `import` appends to a bare module name (§6).
pub const MODULE_EXTENSION: &str = "thy";

pub const HELP_TEXT: &str = r#"
Available commands:
  exit()   - Exit the REPL

Type any Thyddle statement, terminated with ';', to evaluate it.
"#;
