use colored::Colorize;

pub mod is_verbose {
    use std::cell::RefCell;
    thread_local! {
        static VALUE: RefCell<bool> = const { RefCell::new(false) };
    }
    /// May be called multiple times
    pub fn set(new_value: bool) {
        VALUE.with(|value| *value.borrow_mut() = new_value);
    }
    pub fn get() -> bool {
        VALUE.with(|value| *value.borrow())
    }
}

/// Trace line on stderr, only in verbose mode.
#[macro_export]
macro_rules! vprintln {
    ( $fmt:literal $($tt:tt)* ) => {{
        if $crate::output::is_verbose::get() {
            $crate::output::trace(format!($fmt $($tt)*));
        }
    }};
}

#[doc(hidden)]
pub fn trace(line: String) {
    eprintln!("{}", line.dimmed());
}
