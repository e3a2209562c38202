/// Runs an expression and logs how long it took at debug level.
#[macro_export]
macro_rules! timer_debug {
    ($msg:literal, $block:expr) => {{
        let started = jiff::Timestamp::now();
        let result = $block;

        tracing::debug!(
            "{} took {:?}",
            $msg,
            jiff::Timestamp::now().duration_since(started)
        );

        result
    }};
}
