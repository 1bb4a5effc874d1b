use crate::optim::sgd::sgd;

/// Gradient descent with momentum:
///   delta = -learning_rate · gradient + momentum · prior_delta
///
/// `prior_delta` is the delta applied to the same parameter on the previous update.
#[inline]
pub fn momentum(learning_rate: f32, gradient: f32, prior_delta: f32, momentum: f32) -> f32 {
    sgd(learning_rate, gradient) + momentum * prior_delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn adds_scaled_prior_delta() {
        assert_abs_diff_eq!(momentum(0.1, 1.0, -0.5, 0.9), -0.1 - 0.45);
    }

    #[test]
    fn zero_momentum_is_plain_descent() {
        assert_eq!(momentum(0.2, 3.0, 10.0, 0.0), sgd(0.2, 3.0));
    }
}
