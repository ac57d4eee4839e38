//! # Scenario Engine
//!
//! A scenario file describes one deployment and a sequence of steps:
//!
//! ```yaml
//! genesis: "2026-09-01T12:00:00Z"
//! deployer: deployer
//! oracle:
//!   seeds: ["0101010101010101010101010101010101010101010101010101010101010101"]
//! events:
//!   - name: Bronze
//!     organizer: organizer
//!     threshold: 1000
//!     expires_in_days: 365
//! steps:
//!   - action: submit
//!     participant: participant-a
//!     event: Bronze
//!     balance: 2000
//!   - action: fulfil
//! ```
//!
//! Participants, organizers and the deployer are labels; each maps to a
//! stable address. A rejected call does not stop the run: its error and
//! error class are recorded in the step log and the next step runs.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use gt_core::{Address, EventId, RequestId, Timestamp};
use gt_credential::CredentialMetadata;
use gt_crypto::Ed25519KeyPair;
use gt_fhe::{DisclosureOracle, InputContext, MockFheNetwork, MockOracle};
use gt_verifier::{
    CallbackOutcome, Deployment, EncryptedSubmission, Ledger, LedgerError, VerifierConfig,
};

// ─── Scenario model ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub genesis: String,
    #[serde(default = "default_deployer")]
    pub deployer: String,
    pub oracle: OracleSpec,
    #[serde(default)]
    pub verifier: PolicySpec,
    #[serde(default)]
    pub credential: CredentialMetadata,
    pub events: Vec<EventSpec>,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Event names are how steps refer to events, so each must be unique.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for spec in &self.events {
            anyhow::ensure!(
                seen.insert(spec.name.as_str()),
                "duplicate event name {:?}",
                spec.name
            );
        }
        Ok(())
    }
}

fn default_deployer() -> String {
    "deployer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleSpec {
    /// Hex Ed25519 seeds, one per oracle node.
    pub seeds: Vec<String>,
    #[serde(default = "default_attestation_threshold")]
    pub attestation_threshold: usize,
}

fn default_attestation_threshold() -> usize {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySpec {
    #[serde(default)]
    pub pending_ttl_secs: Option<u64>,
    #[serde(default)]
    pub single_attempt_per_event: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSpec {
    pub name: String,
    pub organizer: String,
    pub threshold: u32,
    pub expires_in_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Encrypt `balance` for `participant` and request verification.
    Submit {
        participant: String,
        event: String,
        balance: u32,
    },
    /// Let the oracle answer every queued disclosure and relay the answers.
    Fulfil,
    /// Move block time forward.
    Advance { secs: i64 },
    /// Reclaim every pending request that has outlived the TTL.
    ReclaimExpired,
    Deactivate { event: String },
}

pub fn load_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let scenario: Scenario = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing scenario {}", path.display()))?;
    scenario
        .validate()
        .with_context(|| format!("validating scenario {}", path.display()))?;
    Ok(scenario)
}

// ─── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub description: String,
    pub outcome: String,
    /// `None` on success.
    pub error_class: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub catalog: Address,
    pub registry: Address,
    pub verifier: Address,
    pub steps: Vec<StepRecord>,
    /// Credential balance of every participant that submitted.
    pub balances: BTreeMap<String, u64>,
    pub total_supply: u64,
    pub pending: usize,
    pub ledger_events: usize,
}

impl Report {
    pub fn rejected(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| s.error_class.is_some())
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

const RELAYER: &str = "oracle-relayer";
const KEEPER: &str = "keeper";

struct Run {
    net: Arc<MockFheNetwork>,
    oracle: MockOracle,
    ledger: Ledger<MockFheNetwork>,
    stack: Deployment,
    events: BTreeMap<String, (EventId, Address)>,
    participants: BTreeMap<String, Address>,
    steps: Vec<StepRecord>,
}

pub fn run_scenario(scenario: &Scenario) -> anyhow::Result<Report> {
    scenario.validate()?;
    let mut run = Run::deploy(scenario)?;
    for (index, step) in scenario.steps.iter().enumerate() {
        run.apply(index, step)?;
    }
    run.report()
}

fn label(name: &str) -> anyhow::Result<Address> {
    Address::from_label(name).with_context(|| format!("deriving address for {name:?}"))
}

impl Run {
    fn deploy(scenario: &Scenario) -> anyhow::Result<Self> {
        let genesis = Timestamp::parse(&scenario.genesis).context("genesis")?;
        let signers = scenario
            .oracle
            .seeds
            .iter()
            .map(|s| Ed25519KeyPair::from_seed_hex(s))
            .collect::<Result<Vec<_>, _>>()
            .context("oracle seeds")?;

        let net = Arc::new(MockFheNetwork::new());
        let oracle = MockOracle::new(Arc::clone(&net), signers);
        let config = VerifierConfig {
            trusted_oracle_keys: oracle.public_keys(),
            attestation_threshold: scenario.oracle.attestation_threshold,
            pending_ttl_secs: scenario.verifier.pending_ttl_secs,
            single_attempt_per_event: scenario.verifier.single_attempt_per_event,
        };

        let mut ledger = Ledger::new(Arc::clone(&net), genesis);
        let stack = ledger
            .deploy_stack(label(&scenario.deployer)?, config, scenario.credential.clone())
            .context("deploying verifier stack")?;

        let mut events = BTreeMap::new();
        for spec in &scenario.events {
            let organizer = label(&spec.organizer)?;
            let expiry = genesis
                .checked_add_days(spec.expires_in_days)
                .with_context(|| format!("expiry of {}", spec.name))?;
            let id = ledger
                .create_event(organizer, stack.catalog, spec.threshold, &spec.name, expiry)
                .with_context(|| format!("creating event {}", spec.name))?;
            events.insert(spec.name.clone(), (id, organizer));
        }

        Ok(Self {
            net,
            oracle,
            ledger,
            stack,
            events,
            participants: BTreeMap::new(),
            steps: Vec::new(),
        })
    }

    fn event(&self, name: &str) -> anyhow::Result<(EventId, Address)> {
        self.events
            .get(name)
            .copied()
            .with_context(|| format!("scenario references unknown event {name:?}"))
    }

    fn record(&mut self, index: usize, description: String, result: Result<String, LedgerError>) {
        let record = match result {
            Ok(outcome) => StepRecord {
                index,
                description,
                outcome,
                error_class: None,
            },
            Err(e) => StepRecord {
                index,
                description,
                outcome: e.to_string(),
                error_class: Some(e.class().to_string()),
            },
        };
        self.steps.push(record);
    }

    fn apply(&mut self, index: usize, step: &Step) -> anyhow::Result<()> {
        match step {
            Step::Submit {
                participant,
                event,
                balance,
            } => {
                let who = label(participant)?;
                self.participants.insert(participant.clone(), who);
                let (event_id, _) = self.event(event)?;
                let input = InputContext {
                    contract: self.stack.verifier,
                    user: who,
                };
                let (ciphertext, proof) = self
                    .net
                    .encrypt_input(input, *balance)
                    .context("encrypting balance")?;
                let submission = EncryptedSubmission {
                    event_id,
                    balance: ciphertext,
                    proof,
                };
                let result = self
                    .ledger
                    .verify_and_request_mint(who, self.stack.verifier, &submission)
                    .map(|id| format!("requested {id}"));
                self.record(index, format!("{participant} submits for {event}"), result);
            }
            Step::Fulfil => {
                let responses = self.oracle.fulfil_pending().context("oracle")?;
                let relayer = label(RELAYER)?;
                for response in responses {
                    let result = self.ledger.deliver(relayer, &response).map(|o| match o {
                        CallbackOutcome::Qualified { token_id } => format!("qualified, minted {token_id}"),
                        CallbackOutcome::NotQualified => "not qualified".to_string(),
                    });
                    self.record(index, format!("callback {}", response.request_id), result);
                }
            }
            Step::Advance { secs } => {
                let now = self.ledger.advance(*secs).context("advancing clock")?;
                self.record(index, format!("advance {secs}s"), Ok(format!("now {now}")));
            }
            Step::ReclaimExpired => {
                let stale = self.stale_requests()?;
                let keeper = label(KEEPER)?;
                for id in stale {
                    let result = self
                        .ledger
                        .reclaim_expired(keeper, self.stack.verifier, id)
                        .map(|()| "expired".to_string());
                    self.record(index, format!("reclaim {id}"), result);
                }
            }
            Step::Deactivate { event } => {
                let (event_id, organizer) = self.event(event)?;
                let result = self
                    .ledger
                    .deactivate_event(organizer, self.stack.catalog, event_id)
                    .map(|()| "deactivated".to_string());
                self.record(index, format!("deactivate {event}"), result);
            }
        }
        Ok(())
    }

    fn stale_requests(&self) -> anyhow::Result<Vec<RequestId>> {
        let verifier = self.ledger.verifier(&self.stack.verifier)?;
        let Some(ttl) = verifier.config().pending_ttl_secs else {
            return Ok(Vec::new());
        };
        let now = self.ledger.now();
        Ok(verifier
            .attempts()
            .filter(|a| a.is_stale(ttl, now))
            .map(|a| a.request_id)
            .collect())
    }

    fn report(self) -> anyhow::Result<Report> {
        let registry = self.ledger.registry(&self.stack.registry)?;
        let verifier = self.ledger.verifier(&self.stack.verifier)?;
        let balances = self
            .participants
            .iter()
            .map(|(name, address)| (name.clone(), registry.balance_of(address)))
            .collect();
        Ok(Report {
            catalog: self.stack.catalog,
            registry: self.stack.registry,
            verifier: self.stack.verifier,
            balances,
            total_supply: registry.total_supply(),
            pending: verifier.pending_count(),
            ledger_events: self.ledger.events().len(),
            steps: self.steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    fn scenario(steps: &str) -> Scenario {
        let yaml = format!(
            "genesis: \"2026-09-01T12:00:00Z\"\noracle:\n  seeds: [\"{SEED}\"]\nverifier:\n  pending_ttl_secs: 60\nevents:\n  - name: Bronze\n    organizer: organizer\n    threshold: 1000\n    expires_in_days: 365\nsteps:\n{steps}"
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[test]
    fn test_steps_parse_by_action_tag() {
        let s = scenario("  - action: fulfil\n  - action: advance\n    secs: 5\n  - action: reclaim_expired\n");
        assert!(matches!(s.steps[0], Step::Fulfil));
        assert!(matches!(s.steps[1], Step::Advance { secs: 5 }));
        assert!(matches!(s.steps[2], Step::ReclaimExpired));
        assert_eq!(s.credential.symbol, "TICKET");
        assert_eq!(s.deployer, "deployer");
    }

    #[test]
    fn test_rejections_are_recorded_not_fatal() {
        let s = scenario(
            "  - action: deactivate\n    event: Bronze\n  - action: submit\n    participant: a\n    event: Bronze\n    balance: 5000\n",
        );
        let report = run_scenario(&s).unwrap();
        let rejected: Vec<_> = report.rejected().collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].error_class.as_deref(), Some("validation"));
        assert_eq!(report.balances["a"], 0);
    }

    #[test]
    fn test_reclaim_expired_step() {
        let s = scenario(
            "  - action: submit\n    participant: a\n    event: Bronze\n    balance: 5000\n  - action: advance\n    secs: 60\n  - action: reclaim_expired\n  - action: fulfil\n",
        );
        let report = run_scenario(&s).unwrap();
        assert_eq!(report.pending, 0);
        assert_eq!(report.total_supply, 0);
        let last = report.steps.last().unwrap();
        assert_eq!(last.error_class.as_deref(), Some("protocol"));
    }

    #[test]
    fn test_duplicate_event_names_are_rejected() {
        let mut s = scenario("  - action: fulfil\n");
        let mut twin = s.events[0].clone();
        twin.threshold = 10;
        s.events.push(twin);

        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate event name \"Bronze\""), "{err}");
        assert!(run_scenario(&s).is_err());
    }

    #[test]
    fn test_unknown_event_is_a_scenario_error() {
        let s = scenario("  - action: deactivate\n    event: Gold\n");
        assert!(run_scenario(&s).is_err());
    }
}
