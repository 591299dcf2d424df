//! State-vector engine for the qmc simulator.
//!
//! A [`StateVector`] holds `2^n` amplitudes in `f32` or `f64` and applies
//! gates through specialized kernels. [`StateBuffer`] erases the precision
//! so callers can choose it at run time.
//!
//! Two whole-level paths exist besides gate-by-gate application:
//!
//! - [`StateVector::apply_level_chunked`] splits the state into aligned
//!   chunks and runs every gate of a dependency level on each chunk in
//!   parallel with rayon.
//! - [`StateVector::apply_level_buffered`] writes each gate's result into a
//!   fresh output buffer, parallel over output amplitudes.
//!
//! An optional [`NoiseModel`] injects Pauli errors after unitary gates.
//!
//! Sampling draws shots from the final distribution across independently
//! seeded streams; see [`sampling`].
//!
//! # Example
//!
//! ```rust
//! use qmc_ir::{Circuit, Precision};
//! use qmc_sim::StateBuffer;
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//!
//! let circuit = Circuit::bell().unwrap();
//! let mut state = StateBuffer::new(2, Precision::Double).unwrap();
//! let mut rng = SmallRng::seed_from_u64(0);
//! for gate in circuit.gates() {
//!     state.apply_gate(gate, &mut rng).unwrap();
//! }
//! let counts = state.sample(1000, 42, 4).unwrap();
//! assert_eq!(counts.values().sum::<u64>(), 1000);
//! assert!(counts.keys().all(|k| k == "00" || k == "11"));
//! ```

pub mod buffer;
pub mod error;
pub mod kernels;
pub mod noise;
pub mod op;
pub mod real;
pub mod sampling;
pub mod statevector;

pub use buffer::StateBuffer;
pub use error::{SimError, SimResult};
pub use noise::{NoiseModel, Pauli};
pub use op::{DenseOp, GateOp};
pub use real::Real;
pub use sampling::{Counts, bitstring, sample_counts};
pub use statevector::StateVector;
