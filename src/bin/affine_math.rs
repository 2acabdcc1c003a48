use anyhow::Result;

#[cfg(feature = "cli")]
mod main {
    use super::*;
    use affine_math::{
        BackendDeviation, Matrix4, Quaternion, ScalarBackend, SimdBackend, compare_backends,
    };
    use anyhow::{Context, bail};
    use clap::{Parser, Subcommand};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    /// Largest element magnitude for which products of random matrices cannot
    /// overflow.
    const MAX_SAFE_MAGNITUDE: f32 = 1e18;

    /// Smallest nonzero element magnitude generated for backend comparison.
    const MIN_MAGNITUDE: f32 = 1e-6;

    #[derive(Debug, Parser)]
    #[command(about = "The affine_math transform library", long_about = None)]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Check that the scalar and SIMD backends agree on random matrices
        CompareBackends {
            /// Number of random operand pairs to compare
            #[arg(short, long, default_value_t = 10_000)]
            samples: usize,

            /// Seed for the random number generator
            #[arg(long, default_value_t = 0)]
            seed: u64,

            /// Largest magnitude of the generated matrix elements
            #[arg(long, default_value_t = 1e15)]
            max_magnitude: f32,

            /// Largest acceptable relative deviation between the backends
            #[arg(short, long, default_value_t = 1e-5)]
            tolerance: f32,
        },
        /// Decompose a matrix into rotation, scaling and translation
        Decompose {
            /// The 16 matrix elements, row by row
            #[arg(num_args = 16, allow_negative_numbers = true)]
            values: Vec<f32>,

            /// Interpret the values as column-major (OpenGL) order
            #[arg(long)]
            column_major: bool,
        },
    }

    pub fn main() -> Result<()> {
        env_logger::init();

        let cli = Cli::parse();

        match cli.command {
            Command::CompareBackends {
                samples,
                seed,
                max_magnitude,
                tolerance,
            } => run_backend_comparison(samples, seed, max_magnitude, tolerance),
            Command::Decompose {
                values,
                column_major,
            } => {
                let matrix = if column_major {
                    Matrix4::from_column_major_slice(&values)
                } else {
                    Matrix4::from_row_major_slice(&values)
                }
                .context("Invalid matrix")?;
                print_decomposition(&matrix);
                Ok(())
            }
        }
    }

    fn run_backend_comparison(
        samples: usize,
        seed: u64,
        max_magnitude: f32,
        tolerance: f32,
    ) -> Result<()> {
        if !(MIN_MAGNITUDE..=MAX_SAFE_MAGNITUDE).contains(&max_magnitude) {
            bail!(
                "Maximum magnitude must be between {MIN_MAGNITUDE:e} and {MAX_SAFE_MAGNITUDE:e}, got {max_magnitude:e}"
            );
        }

        log::info!("Comparing backends on {samples} random operand pairs (seed {seed})");

        let mut rng = StdRng::seed_from_u64(seed);

        let deviation = (0..samples).fold(BackendDeviation::default(), |deviation, _| {
            let a = random_matrix(&mut rng, max_magnitude);
            let b = random_matrix(&mut rng, max_magnitude);
            deviation.merged(&compare_backends::<ScalarBackend, SimdBackend>(&a, &b))
        });

        log::debug!("Largest deviation over all operations: {:e}", deviation.max());

        println!("transpose: {:e}", deviation.transpose);
        println!("multiply:  {:e}", deviation.multiply);
        println!("add:       {:e}", deviation.add);
        println!("subtract:  {:e}", deviation.subtract);

        if !deviation.is_within(tolerance) {
            bail!(
                "Backends deviate by {:e}, exceeding tolerance {tolerance:e}",
                deviation.max()
            );
        }
        Ok(())
    }

    /// Generates a matrix whose elements have random signs and magnitudes
    /// spread logarithmically over the given range, with some exact zeros.
    fn random_matrix(rng: &mut StdRng, max_magnitude: f32) -> Matrix4 {
        let min_exponent = MIN_MAGNITUDE.log10();
        let max_exponent = max_magnitude.log10();
        Matrix4::from_column_major_array(&std::array::from_fn(|_| {
            if rng.random_bool(0.05) {
                return 0.0;
            }
            let magnitude = 10.0_f32.powf(rng.random_range(min_exponent..=max_exponent));
            if rng.random_bool(0.5) {
                magnitude
            } else {
                -magnitude
            }
        }))
    }

    fn print_decomposition(matrix: &Matrix4) {
        let euler_angles = matrix.to_euler_angles();
        let scales = matrix.to_scale_values();
        let position = matrix.to_position();

        println!("{matrix}");
        println!("determinant:         {}", matrix.determinant());
        println!("affine:              {}", matrix.is_affine());
        println!("invertible:          {}", matrix.is_invertible());
        println!(
            "euler angles (deg):  {} {} {}",
            euler_angles.x(),
            euler_angles.y(),
            euler_angles.z()
        );
        println!("scales:              {} {} {}", scales.x(), scales.y(), scales.z());
        println!(
            "position:            {} {} {}",
            position.x(),
            position.y(),
            position.z()
        );
        println!(
            "quaternion:          {}",
            Quaternion::from_rotation_matrix(matrix)
        );
    }
}

#[cfg(not(feature = "cli"))]
mod main {
    use super::*;

    pub fn main() -> Result<()> {
        anyhow::bail!("This binary requires the `cli` feature to be enabled.")
    }
}

fn main() -> Result<()> {
    main::main()
}
