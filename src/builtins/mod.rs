//! Built-in functions, organized into categories with one `register` function
//! each. `register_builtins` wires every category into a fresh environment
//! along with the `true`/`false`/`nothing` global constants (§4.3).

use std::rc::Rc;

use crate::env::Environment;
use crate::value::Value;

pub mod arrays;
pub mod console;
pub mod core;
pub mod io;
pub mod math;

pub use arrays::register as register_arrays;
pub use console::register as register_console;
pub use core::register as register_core;
pub use io::register as register_io;
pub use math::register as register_math;

/// Register every built-in function and global constant in `env`.
///
/// `true` and `false` are also scanned as keyword literals (§2), but the
/// language treats them as ordinary identifiers too, so they are bound
/// here as well; `nothing` has no keyword form and exists only as this
/// binding.
pub fn register_builtins(env: &Rc<Environment>) {
    env.define("true", Value::Boolean(true), false);
    env.define("false", Value::Boolean(false), false);
    env.define("nothing", Value::Nothing, false);

    register_core(env);
    register_arrays(env);
    register_math(env);
    register_io(env);
    register_console(env);
}
