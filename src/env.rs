use std::{cell::RefCell, ffi::OsStr};

#[derive(Clone, Copy)]
struct Env {
    verbose: bool,
    dump: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        verbose: var_is("ONEADDR_VERBOSE", "1"),
        dump: var_is("ONEADDR_DUMP", "1"),
    };
    set_env(value);
}

/// `ONEADDR_VERBOSE=1` turns on per-cycle tracing.
pub fn is_verbose() -> bool {
    with_env(|env| env.verbose)
}

/// `ONEADDR_DUMP=1` prints the machine state after every run.
pub fn is_dump() -> bool {
    with_env(|env| env.dump)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
