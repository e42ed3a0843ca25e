//! Airdrop campaign example.
//!
//! Builds a tree from an allocation list, publishes the root and checks a
//! claim the way an on-chain verifier would.
//!
//! Run: `RUST_LOG=debug cargo run --example campaign`

use airdrop_merkle::{
    Allocation, MerkleTree, MerkleTreeOptions, leaf_hash, parse_allocations, verify,
};

const ALLOCATIONS: &str = "\
# recipient,amount
0x1111111111111111111111111111111111111111,1000
0x2222222222222222222222222222222222222222,2500
0x3333333333333333333333333333333333333333,500
";

fn main() -> airdrop_merkle::Result<()> {
    env_logger::init();

    let allocations = parse_allocations(ALLOCATIONS)?;
    let tree = MerkleTree::build(&allocations, MerkleTreeOptions::default())?;

    println!("=== Airdrop Merkle Tree ===\n");
    println!("Root: {}", tree.root_hex());
    println!("Recipients: {}\n", tree.leaf_count());
    println!("{}\n", tree.render());

    // Proof handed to the second recipient
    let claimant: &Allocation = &allocations[1];
    let proof = tree.proof_for(claimant)?;
    println!("Claimant: {claimant}");
    println!("Proof: {}", proof.to_json()?);

    // Verifier side: only the published root, the claim and the proof
    let options = *tree.options();
    let leaf = leaf_hash(&claimant.encode(), &options);
    println!("\nClaim valid: {}", verify(&leaf, &proof, tree.root(), &options));

    let inflated: Allocation = "0x2222222222222222222222222222222222222222,25000".parse()?;
    let leaf = leaf_hash(&inflated.encode(), &options);
    println!("Inflated claim valid: {}", verify(&leaf, &proof, tree.root(), &options));

    Ok(())
}
