/// Plain gradient descent step for one parameter.
///
/// The descent sign is part of the delta, so callers always apply
/// `weight += delta`.
#[inline]
pub fn sgd(learning_rate: f32, gradient: f32) -> f32 {
    -learning_rate * gradient
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_opposes_gradient() {
        assert_eq!(sgd(0.5, 2.0), -1.0);
        assert_eq!(sgd(0.1, 0.0), 0.0);
    }
}
