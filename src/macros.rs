// ============================================================================
// pulse-state - Ergonomic Macros
// ============================================================================

/// Build an observer closure that clones the listed handles before moving
/// them in.
///
/// This reduces the boilerplate of manually cloning `Rc` counters or
/// container handles before handing a callback to `subscribe`.
///
/// # Usage
///
/// ```rust
/// use pulse_state::{observer, ReactiveMap};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut map: ReactiveMap<&str, i32> = ReactiveMap::new();
/// let calls = Rc::new(Cell::new(0));
///
/// let _sub = map.subscribe(observer!(calls => calls.set(calls.get() + 1)));
///
/// map.insert("one", 1);
/// assert_eq!(calls.get(), 1);
/// ```
#[macro_export]
macro_rules! observer {
    ($($n:ident),+ => $body:expr) => {
        {
            $( let $n = $n.clone(); )+
            move || { $body; }
        }
    };
    ($body:expr) => {
        move || { $body; }
    };
}

/// Build a [`ReactiveRecord`](crate::ReactiveRecord) from field literals.
///
/// # Usage
///
/// ```rust
/// use pulse_state::record;
///
/// let mut settings = record! {
///     "volume" => 50,
///     "rate" => 1,
/// };
///
/// assert_eq!(settings.set("volume", 80), Some(50));
/// assert_eq!(settings.get(&"rate"), Some(&1));
/// ```
#[macro_export]
macro_rules! record {
    ( $( $key:expr => $value:expr ),* $(,)? ) => {
        $crate::ReactiveRecord::new([ $( ($key, $value) ),* ])
    };
}
