use crate::traits::{DynamicalSystem, EmbeddedStepper, Scalar, Steppable};

/// Converts a tableau coefficient into the solver's scalar type.
/// An unrepresentable coefficient becomes NaN, which the driver reports as a
/// non-finite state rather than integrating garbage.
fn coeff<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half = coeff::<T>(0.5);
        let sixth = coeff::<T>(1.0 / 6.0);
        let two = coeff::<T>(2.0);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

// Tsitouras (2011) 5(4) tableau. Row i of A sums to c_i.
const TSIT5_C: [f64; 4] = [0.161, 0.327, 0.9, 0.9800255409045097];
const TSIT5_A2: [f64; 1] = [0.161];
const TSIT5_A3: [f64; 2] = [-0.008480655492356989, 0.335480655492357];
const TSIT5_A4: [f64; 3] = [2.897153057105493, -6.359448489975075, 4.3622954328695815];
const TSIT5_A5: [f64; 4] = [
    5.325864828439257,
    -11.748883564062828,
    7.4955393428898365,
    -0.09249506636175525,
];
const TSIT5_A6: [f64; 5] = [
    5.86145544294642,
    -12.92096931784711,
    8.159367898576159,
    -0.071584973281401,
    -0.028269050394068383,
];
/// Fifth-order weights; the sixth stage sits at c = 1.
const TSIT5_B: [f64; 6] = [
    0.09646076681806523,
    0.01,
    0.4798896504144996,
    1.379008574103742,
    -3.290069515436081,
    2.324710524099774,
];
/// Fifth- minus embedded fourth-order weights, the last for the stage at the proposal.
const TSIT5_E: [f64; 7] = [
    -0.00178001105222577714,
    -0.0008164344596567469,
    0.007880878010261995,
    -0.1447110071732629,
    0.5823571654525552,
    -0.45808210592918697,
    1.0 / 66.0,
];

/// Tsitouras 5(4) pair.
///
/// The fifth-order solution is propagated; the embedded fourth-order solution
/// only feeds the error estimate. The seventh stage is evaluated at the
/// proposal (first-same-as-last), but is not reused across attempts because
/// the driver projects accepted states before the next step.
pub struct Tsit5<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    k7: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            k7: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> EmbeddedStepper<T> for Tsit5<T> {
    fn error_order(&self) -> usize {
        4
    }

    fn attempt(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
        proposal: &mut [T],
        error: &mut [T],
    ) {
        let [c2, c3, c4, c5] = TSIT5_C.map(coeff::<T>);
        let [a21] = TSIT5_A2.map(coeff::<T>);
        let [a31, a32] = TSIT5_A3.map(coeff::<T>);
        let [a41, a42, a43] = TSIT5_A4.map(coeff::<T>);
        let [a51, a52, a53, a54] = TSIT5_A5.map(coeff::<T>);
        let [a61, a62, a63, a64, a65] = TSIT5_A6.map(coeff::<T>);
        let [b1, b2, b3, b4, b5, b6] = TSIT5_B.map(coeff::<T>);
        let [e1, e2, e3, e4, e5, e6, e7] = TSIT5_E.map(coeff::<T>);

        let n = state.len();

        system.apply(t, state, &mut self.k1);

        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a21 * self.k1[i]);
        }
        system.apply(t + c2 * dt, &self.tmp, &mut self.k2);

        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a31 * self.k1[i] + a32 * self.k2[i]);
        }
        system.apply(t + c3 * dt, &self.tmp, &mut self.k3);

        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a41 * self.k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
        }
        system.apply(t + c4 * dt, &self.tmp, &mut self.k4);

        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a51 * self.k1[i] + a52 * self.k2[i] + a53 * self.k3[i] + a54 * self.k4[i]);
        }
        system.apply(t + c5 * dt, &self.tmp, &mut self.k5);

        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a61 * self.k1[i]
                    + a62 * self.k2[i]
                    + a63 * self.k3[i]
                    + a64 * self.k4[i]
                    + a65 * self.k5[i]);
        }
        system.apply(t + dt, &self.tmp, &mut self.k6);

        for i in 0..n {
            proposal[i] = state[i]
                + dt * (b1 * self.k1[i]
                    + b2 * self.k2[i]
                    + b3 * self.k3[i]
                    + b4 * self.k4[i]
                    + b5 * self.k5[i]
                    + b6 * self.k6[i]);
        }
        system.apply(t + dt, proposal, &mut self.k7);

        for i in 0..n {
            error[i] = dt
                * (e1 * self.k1[i]
                    + e2 * self.k2[i]
                    + e3 * self.k3[i]
                    + e4 * self.k4[i]
                    + e5 * self.k5[i]
                    + e6 * self.k6[i]
                    + e7 * self.k7[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Tsit5, RK4, TSIT5_A2, TSIT5_A3, TSIT5_A4, TSIT5_A5, TSIT5_A6, TSIT5_B, TSIT5_C, TSIT5_E,
    };
    use crate::traits::{DynamicalSystem, EmbeddedStepper, Steppable};
    use approx::assert_relative_eq;

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    /// dx/dt = cos(2*pi*t); exercises the time argument of every stage.
    struct Seasonal;

    impl DynamicalSystem<f64> for Seasonal {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, t: f64, _x: &[f64], out: &mut [f64]) {
            out[0] = (2.0 * std::f64::consts::PI * t).cos();
        }
    }

    #[test]
    fn rk4_tracks_exponential_decay() {
        let system = Decay { rate: 0.5 };
        let mut solver = RK4::new(1);
        let mut t = 0.0;
        let mut state = vec![1.0];
        for _ in 0..100 {
            solver.step(&system, &mut t, &mut state, 0.1);
        }
        assert_relative_eq!(t, 10.0, epsilon = 1e-9);
        assert_relative_eq!(state[0], (-5.0_f64).exp(), epsilon = 1e-7);
    }

    #[test]
    fn rk4_integrates_time_forcing() {
        let mut solver = RK4::new(1);

        let mut t = 0.0;
        let mut quarter = vec![0.0];
        for _ in 0..20 {
            solver.step(&Seasonal, &mut t, &mut quarter, 0.0125);
        }
        // Integral of cos(2*pi*t) over a quarter period is 1/(2*pi).
        assert_relative_eq!(quarter[0], 1.0 / (2.0 * std::f64::consts::PI), epsilon = 1e-7);

        let mut t = 0.0;
        let mut year = vec![0.0];
        for _ in 0..80 {
            solver.step(&Seasonal, &mut t, &mut year, 0.0125);
        }
        assert_relative_eq!(year[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn tsit5_attempt_leaves_state_untouched() {
        let system = Decay { rate: 1.0 };
        let mut solver = Tsit5::new(1);
        let state = [2.0];
        let mut proposal = [0.0];
        let mut error = [0.0];
        solver.attempt(&system, 0.0, &state, 0.1, &mut proposal, &mut error);
        assert_eq!(state, [2.0]);
        assert_relative_eq!(proposal[0], 2.0 * (-0.1_f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn tsit5_error_estimate_shrinks_with_step() {
        let system = Decay { rate: 1.0 };
        let mut solver = Tsit5::new(1);
        let mut proposal = [0.0];
        let mut coarse = [0.0];
        let mut fine = [0.0];
        solver.attempt(&system, 0.0, &[1.0], 0.4, &mut proposal, &mut coarse);
        solver.attempt(&system, 0.0, &[1.0], 0.1, &mut proposal, &mut fine);
        assert!(coarse[0].abs() > 0.0);
        // Local error of the embedded pair scales like dt^5.
        assert!(fine[0].abs() < coarse[0].abs() / 100.0);
        assert_eq!(solver.error_order(), 4);
    }

    #[test]
    fn tsit5_rows_sum_to_nodes() {
        let rows: [&[f64]; 4] = [&TSIT5_A3, &TSIT5_A4, &TSIT5_A5, &TSIT5_A6];
        let nodes = [TSIT5_C[1], TSIT5_C[2], TSIT5_C[3], 1.0];
        assert_eq!(TSIT5_A2[0], TSIT5_C[0]);
        for (row, node) in rows.iter().zip(nodes) {
            assert_relative_eq!(row.iter().sum::<f64>(), node, epsilon = 1e-14);
        }
        assert_relative_eq!(TSIT5_B.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        // Both solutions are consistent, so the difference weights cancel.
        assert_relative_eq!(TSIT5_E.iter().sum::<f64>(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn tsit5_one_step_error_is_fifth_order() {
        let system = Decay { rate: 1.0 };
        let mut solver = Tsit5::new(1);
        let mut proposal = [0.0];
        let mut error = [0.0];
        let mut local_error = |dt: f64| {
            solver.attempt(&system, 0.0, &[1.0], dt, &mut proposal, &mut error);
            (proposal[0] - (-dt).exp()).abs()
        };
        let coarse = local_error(0.1);
        let fine = local_error(0.05);
        // Local error O(dt^6): halving the step gains about 64x.
        assert!(coarse / fine > 40.0, "error ratio {}", coarse / fine);
        assert!(coarse < 1e-9);
    }
}
