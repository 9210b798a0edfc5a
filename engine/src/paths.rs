//! Effective per-coin paths
//!
//! Combines a coin's default locations with the user's `--wallet`, `--bins`
//! and `--data` overrides and probes the filesystem for each result.

use crate::config::expand_path;
use sdk::{CoinDescriptor, MnError, PathEntry, PathOverrides, ResolvedPaths};
use std::path::{Component, Path, PathBuf};

/// Pick the override when it is non-empty, the default otherwise
pub fn effective<'a>(override_value: &'a str, default: &'a str) -> &'a str {
    if override_value.is_empty() {
        default
    } else {
        override_value
    }
}

/// Compute the effective paths for `descriptor` without touching the disk
fn layout(
    descriptor: &CoinDescriptor,
    overrides: &PathOverrides,
) -> Result<(PathBuf, PathBuf, PathBuf), MnError> {
    let wallet_root = expand_path(Path::new(effective(
        &overrides.wallet,
        &descriptor.default_wallet_path,
    )))?;
    let bin_subpath = nested(effective(&overrides.bins, &descriptor.default_bin_subpath));
    let data_dir = expand_path(Path::new(effective(
        &overrides.data,
        &descriptor.default_data_path,
    )))?;

    Ok((wallet_root.clone(), wallet_root.join(bin_subpath), data_dir))
}

/// The bin subpath always nests under the wallet root, so root and prefix
/// components are dropped
fn nested(subpath: &str) -> PathBuf {
    Path::new(subpath)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect()
}

/// Resolve and probe every path the coin's commands work with
///
/// Absent paths are reported through `exists`, never as errors.
pub fn resolve(
    descriptor: &CoinDescriptor,
    overrides: &PathOverrides,
) -> Result<ResolvedPaths, MnError> {
    let (wallet_root, bin_dir, data_dir) = layout(descriptor, overrides)?;
    let daemon_bin = bin_dir.join(&descriptor.daemon_bin);
    let status_bin = bin_dir.join(&descriptor.status_bin);
    let config_file = data_dir.join(&descriptor.config_file);

    Ok(ResolvedPaths {
        wallet_root: dir_entry(wallet_root),
        bin_dir: dir_entry(bin_dir),
        daemon_bin: file_entry(daemon_bin),
        status_bin: file_entry(status_bin),
        data_dir: dir_entry(data_dir),
        config_file: file_entry(config_file),
    })
}

fn dir_entry(path: PathBuf) -> PathEntry {
    let exists = path.is_dir();
    PathEntry::new(path, exists)
}

fn file_entry(path: PathBuf) -> PathEntry {
    let exists = path.is_file();
    PathEntry::new(path, exists)
}
