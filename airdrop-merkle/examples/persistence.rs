//! Persistence example.
//!
//! Dumps a tree to JSON, loads it back into a campaign cache and serves
//! proofs from the cached copy.
//!
//! Run: `cargo run --example persistence`

use airdrop_merkle::{MerkleTree, MerkleTreeData, MerkleTreeOptions, TreeCache};

fn main() -> airdrop_merkle::Result<()> {
    env_logger::init();

    let records: Vec<String> = (0..10).map(|i| format!("user{i}:{}", (i + 1) * 100)).collect();
    let tree = MerkleTree::build(&records, MerkleTreeOptions::evm_sorted())?;

    let json = tree.dump().to_json()?;
    println!("Serialized tree:\n{json}\n");

    let cache: TreeCache<u64> = TreeCache::new();
    let loaded = cache.get_or_build(42, || MerkleTree::load(MerkleTreeData::from_json(&json)?))?;
    println!("Roots match: {}", loaded.root() == tree.root());

    for (i, record) in records.iter().enumerate().step_by(3) {
        let proof = cache.proof(&42, i).expect("campaign cached")?;
        println!(
            "{record}: {} steps, valid = {}",
            proof.len(),
            loaded.verify_proof(record, &proof)
        );
    }

    Ok(())
}
