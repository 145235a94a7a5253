// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use super::sample_rate::SampleRate;
use rand::Rng;

/// One-shot random draw against a sample rate.
pub(crate) struct Sampler(SampleRate);

impl Sampler {
    pub(crate) fn new_with_rate(rate: SampleRate) -> Self {
        Sampler(rate)
    }

    /// Decide whether the current metric event should be sent. Rates of
    /// exactly 1.0 always pass without consulting the RNG.
    pub(crate) fn roll(&self) -> bool {
        if !self.0.is_sampled() {
            return true;
        }

        rand::thread_rng().gen_bool(f64::from(self.0.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::Sampler;
    use crate::builder::SampleRate;

    #[test]
    fn test_sampler_rate_one_always_passes() {
        let sampler = Sampler::new_with_rate(SampleRate::try_from(1.0).unwrap());
        for _ in 0..100 {
            assert!(sampler.roll());
        }
    }

    #[test]
    fn test_sampler_sub_one_rate_suppresses_some() {
        let sampler = Sampler::new_with_rate(SampleRate::try_from(0.5).unwrap());
        let passed = (0..1000).filter(|_| sampler.roll()).count();

        assert!(passed > 0); // always happening (probably)
        assert!(passed < 1000); // never happening (probably)
    }
}
