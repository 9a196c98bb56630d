//! Build script that validates and exports predeploy contract bytecode.
//!
//! This script:
//! 1. Reads the frozen artifacts in the `artifacts/` directory
//! 2. Validates that each artifact's code hash matches its deployed bytecode
//! 3. Generates Rust constants (address, code, code hash) for each artifact

use std::{env, fs, io::Write, path::Path};

use alloy_primitives::{hex, keccak256};
use serde::Deserialize;

/// Artifact format for predeploy contract JSON files
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredeployArtifact {
    address: String,
    code_hash: String,
    deployed_bytecode: String,
}

/// Configuration for a predeploy contract to be validated and processed
struct ContractConfig<'a> {
    /// Contract name (e.g., "DeterministicDeploymentProxy")
    name: &'a str,
    /// Output Rust file name (e.g., `deterministic_deployment_proxy.rs`)
    output_file: &'a str,
}

/// Reads an artifact and checks its code hash against the deployed bytecode.
fn load_artifact(artifacts_dir: &Path, config: &ContractConfig<'_>) -> PredeployArtifact {
    let path = artifacts_dir.join(format!("{}.json", config.name));
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Failed to read {} artifact", config.name));
    let artifact: PredeployArtifact = serde_json::from_str(&content)
        .unwrap_or_else(|_| panic!("Failed to parse {} artifact", config.name));

    let bytecode = hex::decode(&artifact.deployed_bytecode).expect("Invalid bytecode hex");
    let computed_hash = keccak256(&bytecode);
    let expected_hash = hex::decode(&artifact.code_hash).expect("Invalid code hash hex");
    assert!(
        computed_hash.as_slice() == expected_hash.as_slice(),
        r#"
ERROR: {name} artifact code hash mismatch!

artifacts/{name}.json declares a code hash that does not match its deployed bytecode.

Expected: {expected}
Computed: {computed:x}
"#,
        name = config.name,
        expected = artifact.code_hash,
        computed = computed_hash,
    );

    artifact
}

/// Generates Rust source file with address and bytecode constants for a contract.
fn generate_rust_constants(
    out_dir: &Path,
    config: &ContractConfig<'_>,
    artifact: &PredeployArtifact,
) {
    let generated_path = out_dir.join(config.output_file);
    let mut file = fs::File::create(&generated_path).expect("Failed to create generated file");

    writeln!(file, "// Auto-generated {} contract constants.", config.name).unwrap();
    writeln!(file, "// DO NOT EDIT - generated by build.rs from artifacts/").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "use alloy_primitives::{{address, b256, bytes, Address, Bytes, B256}};")
        .unwrap();
    writeln!(file).unwrap();
    writeln!(file, "/// {} contract address", config.name).unwrap();
    writeln!(file, "pub const ADDRESS: Address = address!(\"{}\");", artifact.address).unwrap();
    writeln!(file, "/// {} contract bytecode", config.name).unwrap();
    writeln!(file, "pub const CODE: Bytes = bytes!(\"{}\");", artifact.deployed_bytecode).unwrap();
    writeln!(file, "/// {} contract code hash", config.name).unwrap();
    writeln!(file, "pub const CODE_HASH: B256 = b256!(\"{}\");", artifact.code_hash).unwrap();
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let out_dir = env::var("OUT_DIR").unwrap();
    let crate_dir = Path::new(&manifest_dir);
    let out_path = Path::new(&out_dir);

    let contracts = [ContractConfig {
        name: "DeterministicDeploymentProxy",
        output_file: "deterministic_deployment_proxy.rs",
    }];

    for config in &contracts {
        println!(
            "cargo::rerun-if-changed={}",
            crate_dir.join(format!("artifacts/{}.json", config.name)).display()
        );
    }

    let artifacts_dir = crate_dir.join("artifacts");
    for config in &contracts {
        let artifact = load_artifact(&artifacts_dir, config);
        generate_rust_constants(out_path, config, &artifact);
    }
}
