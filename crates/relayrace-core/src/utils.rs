/*!
 * Relayrace Utils
 *
 * Utilitários de hashing compartilhados
 */

use sha2::{Digest, Sha256};

/// Hash canônico de conteúdo de uma transação serializada: SHA-256 dos
/// bytes crus, em hex maiúsculo, como o node reporta hashes de transação.
pub fn tx_content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode_upper(digest)
}
