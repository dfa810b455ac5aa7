//! End-to-end driver: translate a circuit and its assignment, run the
//! generator, specialize, prove in two stages and verify.
//!
//! Exits 0 when the proof verifies, 5 when the circuit file cannot be read
//! and -1 on any parse, input, witness or verification failure.

use anyhow::{Context, Result};
use ark_bn254::Bn254;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use universal_snark::circuit::{ArithCircuit, CircuitError, CircuitReader};
use universal_snark::snark::{
    customize_key, generate, is_satisfied, prove, prove_stage1, rnd_gen, verify,
};

const LOG_TARGET: &str = "bin::universal_snark";

#[derive(Debug, Parser)]
#[command(name = "universal_snark")]
#[command(about = "Prove and verify one assignment of a universal circuit", long_about = None)]
struct Args {
    /// Arithmetic circuit file
    arith_file: PathBuf,

    /// Wire assignment file (`<wireId> <hexValue>` per line)
    inputs_file: PathBuf,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!(target: LOG_TARGET, "{err:#}");
            std::process::exit(-1);
        }
    }
}

fn run(args: &Args) -> Result<i32> {
    let circuit = match ArithCircuit::load(&args.arith_file) {
        Ok(circuit) => circuit,
        Err(err @ CircuitError::Io { .. }) => {
            tracing::error!(target: LOG_TARGET, "{err}");
            return Ok(5);
        }
        Err(err) => return Err(err).context("parsing the circuit file"),
    };
    let mut reader =
        CircuitReader::translate(circuit).context("translating the circuit to constraints")?;
    reader
        .read_inputs_file(&args.inputs_file)
        .context("loading the inputs file")?;
    let layout = reader.layout();

    let mut rng = StdRng::from_entropy();

    tracing::info!(target: LOG_TARGET, "running the generator");
    let keys = generate::<Bn254, _>(reader.constraint_system(), &layout, &mut rng)
        .context("running the generator")?;
    tracing::info!(
        target: LOG_TARGET,
        pk_g1 = keys.pk.num_g1_elements(),
        pk_g2 = keys.pk.num_g2_elements(),
        vk_g1 = keys.vk.num_g1_elements(),
        vk_g2 = keys.vk.num_g2_elements(),
        vk_gt = keys.vk.num_gt_elements(),
        "generator done"
    );

    tracing::info!(target: LOG_TARGET, "customizing the universal key");
    let ck = customize_key(&keys, reader.spec_values()).context("customizing the key")?;
    tracing::info!(
        target: LOG_TARGET,
        spec_key_g1 = keys.spec_key.num_g1_elements(),
        "customization done"
    );

    tracing::info!(target: LOG_TARGET, "prover stage 1");
    let stage1 = prove_stage1(&keys.pk, reader.stmt_values(), reader.witness_values(), &mut rng)
        .context("prover stage 1")?;

    // randomness is bound to the folded spec commitment plus the stage-1
    // commitment; the verifier rebuilds the same point
    let rnd_input = rnd_gen::<Bn254>(
        layout.n_rnd,
        &(ck.gamma_spec_g1_computed + stage1.comm_g1),
    );

    tracing::info!(target: LOG_TARGET, "evaluating the circuit");
    let assignment = reader.eval(&rnd_input).context("evaluating the circuit")?;
    if !is_satisfied(&keys.pk.matrices, &assignment.to_variable_vec()) {
        tracing::error!(
            target: LOG_TARGET,
            "the constraint system is not satisfied by the value assignment"
        );
        return Ok(-1);
    }

    tracing::info!(target: LOG_TARGET, "prover stage 2");
    let proof = prove(&keys.pk, &ck, &assignment, &stage1, &mut rng).context("prover stage 2")?;
    tracing::info!(
        target: LOG_TARGET,
        proof_g1 = proof.num_g1_elements(),
        proof_g2 = proof.num_g2_elements(),
        "proof assembled"
    );
    if !proof.is_well_formed() {
        tracing::error!(target: LOG_TARGET, "proof is not well formed");
        return Ok(-1);
    }

    tracing::info!(target: LOG_TARGET, "running the verifier");
    let accepted = verify(&keys.vk, &ck, &assignment.stmt, &proof).context("verifying")?;
    if accepted {
        tracing::info!(target: LOG_TARGET, "verification passed");
        Ok(0)
    } else {
        tracing::error!(target: LOG_TARGET, "verification failed");
        Ok(-1)
    }
}
