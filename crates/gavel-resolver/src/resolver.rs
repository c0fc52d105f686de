//! Transitive dependency resolution over an ordered repository set.
//!
//! Resolution runs breadth-first from the classpath roots, prefetching each
//! level's descriptors concurrently. Version conflicts are settled by
//! [`crate::select`], and because a winner's dependency list can differ from
//! a loser's, the walk is re-run with the winning selections applied until a
//! pass fetches exactly the versions selection chose. Passes share a
//! descriptor cache, so re-runs only hit sources for newly selected versions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use gavel_core::buildscript::{Buildscript, RootDependency};
use gavel_core::version::{Version, VersionSpec};
use gavel_core::warning::Warning;
use gavel_maven::metadata::VersionListing;
use gavel_maven::set::{LookupOutcome, RepositorySet};
use gavel_util::errors::{GavelError, GavelResult};
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::classpath::{assemble, Classpath};
use crate::graph::{ArtifactNode, DependencyGraph, NodeState};
use crate::select::{select_version, Candidate};

const MAX_CONCURRENT_FETCHES: usize = 8;

/// Upper bound on selection re-runs. Each re-run applies a strictly newer
/// selection map, so hitting the cap means the candidate sets are oscillating.
const MAX_PASSES: usize = 16;

/// The outcome of a successful resolution.
#[derive(Debug)]
pub struct Resolution {
    pub graph: DependencyGraph,
    /// Final per-identity lifecycle states, keyed like [`ArtifactNode::key`].
    pub states: HashMap<String, NodeState>,
    pub warnings: Vec<Warning>,
}

/// A pending graph visit: one concrete version of one identity, plus the
/// ancestry needed for cycle reporting and root-order bookkeeping.
struct QueueEntry {
    group: String,
    artifact: String,
    version: String,
    classifier: Option<String>,
    depth: usize,
    parent_key: Option<String>,
    root_rank: usize,
    /// Identity keys of every ancestor, root first.
    path: Vec<String>,
}

impl QueueEntry {
    fn identity(&self) -> String {
        identity_key(&self.group, &self.artifact, self.classifier.as_deref())
    }

    fn coordinate(&self) -> String {
        coord_key(
            &self.group,
            &self.artifact,
            &self.version,
            self.classifier.as_deref(),
        )
    }
}

fn identity_key(group: &str, artifact: &str, classifier: Option<&str>) -> String {
    match classifier {
        Some(c) => format!("{group}:{artifact}:{c}"),
        None => format!("{group}:{artifact}"),
    }
}

fn coord_key(group: &str, artifact: &str, version: &str, classifier: Option<&str>) -> String {
    match classifier {
        Some(c) => format!("{group}:{artifact}:{version}:{c}"),
        None => format!("{group}:{artifact}:{version}"),
    }
}

/// Everything one breadth-first pass produced.
struct PassOutput {
    graph: DependencyGraph,
    states: HashMap<String, NodeState>,
    /// Identity key → every version requested for it during this pass.
    candidates: HashMap<String, IdentityRequests>,
    /// Identity key → the version actually fetched and walked this pass.
    resolved_versions: HashMap<String, String>,
}

struct IdentityRequests {
    group: String,
    artifact: String,
    candidates: Vec<Candidate>,
}

/// Resolve the transitive closure of `roots` against `repos`.
///
/// All-or-nothing: any unfetchable artifact, dependency cycle, or
/// unresolvable version conflict fails the whole call. Dropping the returned
/// future cancels resolution and discards all partial state.
pub async fn resolve(
    roots: &[RootDependency],
    repos: &RepositorySet,
    client: &Client,
) -> GavelResult<Resolution> {
    let mut descriptor_cache: HashMap<String, LookupOutcome> = HashMap::new();
    let mut listing_cache: HashMap<String, Option<VersionListing>> = HashMap::new();
    let mut selection: HashMap<String, String> = HashMap::new();

    for pass_number in 1..=MAX_PASSES {
        tracing::debug!(pass = pass_number, "starting resolution pass");
        let pass = run_pass(
            roots,
            repos,
            client,
            &mut descriptor_cache,
            &mut listing_cache,
            &selection,
        )
        .await?;

        // Settle every identity's conflict with the full candidate set now
        // visible. Keys are sorted so the first conflict reported is stable.
        let mut keys: Vec<&String> = pass.candidates.keys().collect();
        keys.sort();

        let mut winners: HashMap<String, String> = HashMap::new();
        for key in keys {
            let requests = &pass.candidates[key];
            let listing = if requests.candidates.iter().any(|c| c.spec.is_range()) {
                get_listing(
                    repos,
                    client,
                    &mut listing_cache,
                    &requests.group,
                    &requests.artifact,
                )
                .await?
            } else {
                None
            };
            let winner = select_version(key, &requests.candidates, listing.as_ref())?;
            winners.insert(key.clone(), winner);
        }

        let stable = winners
            .iter()
            .all(|(key, version)| pass.resolved_versions.get(key) == Some(version));
        if stable {
            let warnings = collect_warnings(&pass, &winners, &descriptor_cache);
            return Ok(Resolution {
                graph: pass.graph,
                states: pass.states,
                warnings,
            });
        }

        tracing::debug!(pass = pass_number, "selection changed, re-walking graph");
        selection = winners;
    }

    Err(GavelError::UnresolvableConflict {
        identity: "<classpath>".to_string(),
        detail: format!("version selection did not converge after {MAX_PASSES} passes"),
    }
    .into())
}

/// Resolve a buildscript's classpath declarations end to end.
pub async fn resolve_buildscript(
    script: &Buildscript,
    client: &Client,
) -> GavelResult<(Classpath, Vec<Warning>)> {
    let repos = RepositorySet::from_decls(&script.repositories);
    let roots = script.root_dependencies()?;
    let resolution = resolve(&roots, &repos, client).await?;
    let classpath = assemble(&resolution.graph)?;
    Ok((classpath, resolution.warnings))
}

/// One breadth-first walk from the roots, honoring `selection` overrides.
async fn run_pass(
    roots: &[RootDependency],
    repos: &RepositorySet,
    client: &Client,
    descriptor_cache: &mut HashMap<String, LookupOutcome>,
    listing_cache: &mut HashMap<String, Option<VersionListing>>,
    selection: &HashMap<String, String>,
) -> GavelResult<PassOutput> {
    let mut graph = DependencyGraph::new();
    let mut states: HashMap<String, NodeState> = HashMap::new();
    let mut candidates: HashMap<String, IdentityRequests> = HashMap::new();
    let mut resolved_versions: HashMap<String, String> = HashMap::new();
    let mut queue: VecDeque<QueueEntry> = VecDeque::new();
    let mut seq = 0usize;

    for (rank, root) in roots.iter().enumerate() {
        let coordinate = &root.coordinate;
        let key = identity_key(
            &coordinate.group,
            &coordinate.artifact,
            coordinate.classifier.as_deref(),
        );
        record_candidate(
            &mut candidates,
            &key,
            &coordinate.group,
            &coordinate.artifact,
            Candidate {
                spec: coordinate.version.clone(),
                pinned: root.pin,
                requested_by: "classpath declaration".to_string(),
            },
        );
        let version = effective_version(
            repos,
            client,
            listing_cache,
            selection,
            &key,
            &coordinate.group,
            &coordinate.artifact,
            &coordinate.version,
        )
        .await?;
        states.entry(key).or_insert(NodeState::Pending);
        queue.push_back(QueueEntry {
            group: coordinate.group.clone(),
            artifact: coordinate.artifact.clone(),
            version,
            classifier: coordinate.classifier.clone(),
            depth: 0,
            parent_key: None,
            root_rank: rank,
            path: Vec::new(),
        });
    }

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));

    while !queue.is_empty() {
        let current_depth = queue.front().map(|e| e.depth).unwrap_or(0);
        let mut level: Vec<QueueEntry> = Vec::new();
        while queue.front().is_some_and(|e| e.depth == current_depth) {
            if let Some(entry) = queue.pop_front() {
                level.push(entry);
            }
        }

        // A visit whose own identity appears among its ancestors closes a
        // cycle; report the chain from first occurrence back to itself.
        for entry in &level {
            let key = entry.identity();
            if let Some(pos) = entry.path.iter().position(|ancestor| *ancestor == key) {
                let mut chain: Vec<String> = entry.path[pos..].to_vec();
                chain.push(key.clone());
                states.insert(key, NodeState::Failed);
                return Err(GavelError::CyclicDependency { chain }.into());
            }
        }

        // Prefetch this level's descriptors concurrently, deduplicated by
        // concrete coordinate and skipping anything already cached.
        let mut wanted: HashSet<String> = HashSet::new();
        let mut join_set = JoinSet::new();
        for entry in &level {
            let coord = entry.coordinate();
            if resolved_versions.contains_key(&entry.identity())
                || descriptor_cache.contains_key(&coord)
                || !wanted.insert(coord)
            {
                continue;
            }
            states.insert(entry.identity(), NodeState::Resolving);

            let group = entry.group.clone();
            let artifact = entry.artifact.clone();
            let version = entry.version.clone();
            let classifier = entry.classifier.clone();
            let repos = repos.clone();
            let client = client.clone();
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore.acquire().await;
                let outcome = repos
                    .lookup_descriptor(&client, &group, &artifact, &version, classifier.as_deref())
                    .await;
                let coord = coord_key(&group, &artifact, &version, classifier.as_deref());
                (coord, outcome)
            });
        }
        while let Some(joined) = join_set.join_next().await {
            let (coord, outcome) = joined.map_err(|e| GavelError::Network {
                message: format!("descriptor lookup task failed: {e}"),
            })?;
            if let Some(found) = outcome? {
                descriptor_cache.insert(coord, found);
            }
        }

        for entry in level {
            let key = entry.identity();

            // Identity already walked this pass: only record the extra edge.
            if resolved_versions.contains_key(&key) {
                if let Some(idx) = graph.find(&key) {
                    graph.merge_root_rank(idx, entry.root_rank);
                    match &entry.parent_key {
                        Some(parent) => {
                            if let Some(parent_idx) = graph.find(parent) {
                                graph.add_edge(parent_idx, idx);
                            }
                        }
                        None => graph.add_root(idx),
                    }
                }
                continue;
            }

            let Some(outcome) = descriptor_cache.get(&entry.coordinate()).cloned() else {
                states.insert(key, NodeState::Failed);
                return Err(GavelError::NotFound {
                    coordinate: coord_key(
                        &entry.group,
                        &entry.artifact,
                        &entry.version,
                        entry.classifier.as_deref(),
                    ),
                }
                .into());
            };

            resolved_versions.insert(key.clone(), entry.version.clone());
            states.insert(key.clone(), NodeState::Resolved);

            let idx = graph.add_node(ArtifactNode {
                group: entry.group.clone(),
                artifact: entry.artifact.clone(),
                version: entry.version.clone(),
                classifier: entry.classifier.clone(),
                source: outcome.source.clone(),
                jar_url: Some(outcome.jar_url.clone()),
                checksum: outcome.checksum.clone(),
                root_rank: entry.root_rank,
                seq,
            });
            seq += 1;
            match &entry.parent_key {
                Some(parent) => {
                    if let Some(parent_idx) = graph.find(parent) {
                        graph.add_edge(parent_idx, idx);
                    }
                }
                None => graph.add_root(idx),
            }

            let mut child_path = entry.path.clone();
            child_path.push(key.clone());

            for dep in outcome.descriptor.classpath_dependencies() {
                let Some(dep_version) = dep.version.as_deref().filter(|v| !v.is_empty()) else {
                    tracing::debug!(
                        "skipping {}:{}: descriptor declares no version",
                        dep.group_id,
                        dep.artifact_id
                    );
                    continue;
                };
                let dep_key =
                    identity_key(&dep.group_id, &dep.artifact_id, dep.classifier.as_deref());
                let spec = VersionSpec::parse(dep_version)?;
                record_candidate(
                    &mut candidates,
                    &dep_key,
                    &dep.group_id,
                    &dep.artifact_id,
                    Candidate {
                        spec: spec.clone(),
                        pinned: false,
                        requested_by: coord_key(
                            &entry.group,
                            &entry.artifact,
                            &entry.version,
                            entry.classifier.as_deref(),
                        ),
                    },
                );
                let dep_version = effective_version(
                    repos,
                    client,
                    listing_cache,
                    selection,
                    &dep_key,
                    &dep.group_id,
                    &dep.artifact_id,
                    &spec,
                )
                .await?;
                states.entry(dep_key).or_insert(NodeState::Pending);
                queue.push_back(QueueEntry {
                    group: dep.group_id.clone(),
                    artifact: dep.artifact_id.clone(),
                    version: dep_version,
                    classifier: dep.classifier.clone(),
                    depth: entry.depth + 1,
                    parent_key: Some(key.clone()),
                    root_rank: entry.root_rank,
                    path: child_path.clone(),
                });
            }
        }
    }

    Ok(PassOutput {
        graph,
        states,
        candidates,
        resolved_versions,
    })
}

fn record_candidate(
    candidates: &mut HashMap<String, IdentityRequests>,
    key: &str,
    group: &str,
    artifact: &str,
    candidate: Candidate,
) {
    candidates
        .entry(key.to_string())
        .or_insert_with(|| IdentityRequests {
            group: group.to_string(),
            artifact: artifact.to_string(),
            candidates: Vec::new(),
        })
        .candidates
        .push(candidate);
}

/// The concrete version a request resolves to in this pass: a selection
/// override if one exists, the exact version as written, or the highest
/// listed version inside a range.
#[allow(clippy::too_many_arguments)]
async fn effective_version(
    repos: &RepositorySet,
    client: &Client,
    listing_cache: &mut HashMap<String, Option<VersionListing>>,
    selection: &HashMap<String, String>,
    key: &str,
    group: &str,
    artifact: &str,
    spec: &VersionSpec,
) -> GavelResult<String> {
    if let Some(selected) = selection.get(key) {
        return Ok(selected.clone());
    }
    match spec {
        VersionSpec::Exact(version) => Ok(version.original.clone()),
        VersionSpec::Range(range) => {
            let listing = get_listing(repos, client, listing_cache, group, artifact).await?;
            let best = listing.as_ref().and_then(|listing| {
                listing
                    .versions
                    .iter()
                    .map(|v| Version::parse(v))
                    .filter(|v| range.contains(v))
                    .max_by(|a, b| a.cmp(b).then_with(|| a.original.cmp(&b.original)))
            });
            match best {
                Some(version) => Ok(version.original),
                None => Err(GavelError::UnresolvableConflict {
                    identity: key.to_string(),
                    detail: format!("no available version satisfies {range}"),
                }
                .into()),
            }
        }
    }
}

async fn get_listing(
    repos: &RepositorySet,
    client: &Client,
    cache: &mut HashMap<String, Option<VersionListing>>,
    group: &str,
    artifact: &str,
) -> GavelResult<Option<VersionListing>> {
    let key = format!("{group}:{artifact}");
    if !cache.contains_key(&key) {
        let listing = repos.lookup_versions(client, group, artifact).await?;
        cache.insert(key.clone(), listing);
    }
    Ok(cache.get(&key).cloned().flatten())
}

/// Advisories for the final, stable pass: deprecated-source provenance for
/// every node, and one override notice per losing requested version.
fn collect_warnings(
    pass: &PassOutput,
    winners: &HashMap<String, String>,
    descriptor_cache: &HashMap<String, LookupOutcome>,
) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for idx in pass.graph.node_indices() {
        let node = pass.graph.node(idx);
        let coord = coord_key(
            &node.group,
            &node.artifact,
            &node.version,
            node.classifier.as_deref(),
        );
        if let Some(outcome) = descriptor_cache.get(&coord) {
            if outcome.deprecated {
                warnings.push(Warning::DeprecatedSourceUsed {
                    source: outcome.source.clone(),
                    coordinate: coord,
                });
            }
        }
    }

    for (key, requests) in &pass.candidates {
        let Some(selected) = winners.get(key) else {
            continue;
        };
        let any_pin = requests
            .candidates
            .iter()
            .any(|c| c.pinned && c.spec.exact().is_some_and(|v| &v.original == selected));

        let mut reported: HashSet<&str> = HashSet::new();
        for candidate in &requests.candidates {
            let Some(requested) = candidate.spec.exact() else {
                continue;
            };
            if &requested.original == selected || !reported.insert(&requested.original) {
                continue;
            }
            let reason = if any_pin {
                "pinned at classpath level"
            } else {
                "highest version wins"
            };
            warnings.push(Warning::VersionOverridden {
                identity: key.clone(),
                requested: requested.original.clone(),
                selected: selected.clone(),
                reason: reason.to_string(),
            });
        }
    }

    warnings.sort_by_key(|w| w.to_string());
    warnings
}
