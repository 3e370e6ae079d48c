//! A minimal signal abstraction: something that can be evaluated for an input.

/// A trait for "signals" which have an input and an output type, and can be evaluated for the
/// given input.
pub trait Signal<IN, OUT>: Send {
    /// Evaluate this signal for the given input, yielding an output.
    fn evaluate(&mut self, input: IN) -> OUT;
}

impl<IN, OUT, F> Signal<IN, OUT> for F
where
    F: FnMut(IN) -> OUT + Send,
{
    fn evaluate(&mut self, input: IN) -> OUT {
        self(input)
    }
}
