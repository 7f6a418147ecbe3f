pub trait BasicFilter {
    /// Perform one step of a filter.
    fn step(&mut self, x: f64) -> f64;

    /// Filters a whole buffer in place.
    fn process(&mut self, samples: &mut [f64]) {
        for s in samples {
            *s = self.step(*s);
        }
    }
}
