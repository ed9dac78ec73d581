use crate::config::ClearingConfig;
use crate::core::LedgerEntry;
use crate::normalize::Normalizer;

/// Mirror entries for the clearing account (Sammelkasse) batch.
///
/// Every entry whose counter account is the clearing account gets exactly
/// one mirror: amount negated, counter account replaced by the mirror
/// account, memo rewritten by the source profile. Other entries are not
/// mirrored, so mirrors of a run are never mirrored again.
pub fn mirror_entries<N>(
    entries: &[LedgerEntry],
    clearing: &ClearingConfig,
    normalizer: &N,
) -> Vec<LedgerEntry>
where
    N: Normalizer + ?Sized,
{
    entries
        .iter()
        .filter(|e| e.counter_account.as_deref() == Some(clearing.account.as_str()))
        .map(|e| LedgerEntry {
            amount: -e.amount,
            counter_account: Some(clearing.mirror_account.clone()),
            document_text: normalizer.mirror_text(&e.document_text),
            ..e.clone()
        })
        .collect()
}
