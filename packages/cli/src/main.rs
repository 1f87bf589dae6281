#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Command-line front end for the citizen services core.
//!
//! ```text
//! citizen_services zone <lat> <lng> [--config zones.toml]
//! citizen_services zones [--config zones.toml]
//! citizen_services transitions <status> [--role staff]
//! citizen_services transition <request.json> <target> (--staff-key <key> | --agent-id <id> | --system) [--note <text>]
//! citizen_services escalate <request.json> --reason <text> [--level manager] (--staff-key <key> | --system)
//! citizen_services milestone <request.json> <milestone> --agent-id <id>
//! citizen_services filter-citizens <citizens.json> [--verification verified] [--city amm]
//! citizen_services sla <category> <priority>
//! citizen_services kpis <requests.json> [--category ..] [--zone ..] [--from ..] [--to ..]
//! citizen_services heatmap <requests.json> [--buckets] [--category ..] [--zone ..] [--from ..] [--to ..]
//! citizen_services cohorts <requests.json> [--category ..] [--zone ..] [--from ..] [--to ..]
//! citizen_services agent-productivity <requests.json> <agents.json> [--zone ..] [--from ..] [--to ..]
//! citizen_services citizen-stats <citizens.json> <requests.json> <citizen_id>
//! ```
//!
//! JSON documents are read from files and results are written to stdout as
//! pretty-printed JSON. The operator is identified the way API calls are:
//! a staff key or an agent id. Set `RUST_LOG` to see library logging.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::Utc;
use citizen_services_agent::ServiceAgent;
use citizen_services_analytics::{
    DashboardQuery, agent_productivity, bucket_points, citizen_statistics, cohorts,
    feature_collection, heatmap, kpis, sla_policy,
};
use citizen_services_citizen_models::CitizenProfile;
use citizen_services_filter::{CitizenFilter, apply_filter};
use citizen_services_geo_models::Coordinate;
use citizen_services_lifecycle::{
    DEFAULT_ESCALATION_LEVEL, allowed_next, apply_transition_with_note,
    credentials::{StaticCredentials, actor_from_credentials},
    escalate, record_milestone,
};
use citizen_services_request_models::{
    Actor, ActorRole, Milestone, Priority, RequestStatus, ServiceRequest,
};
use citizen_services_zone::ZoneResolver;
use clap::{Args, Parser, Subcommand};
use serde::{Serialize, de::DeserializeOwned};

#[derive(Parser)]
#[command(
    name = "citizen_services",
    about = "Zone lookup, request workflow and dashboard analytics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the service zone for a coordinate
    Zone {
        /// Latitude in decimal degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        /// Zone rules TOML file (defaults to the built-in Amman rules)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the zone ids a rule set can produce
    Zones {
        /// Zone rules TOML file (defaults to the built-in Amman rules)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the statuses reachable from a status
    Transitions {
        /// Current status (e.g. `in_progress` or "IN PROGRESS")
        #[arg(value_parser = parse_status)]
        status: RequestStatus,
        /// Only show moves this role may make
        #[arg(long, value_parser = parse_role)]
        role: Option<ActorRole>,
    },
    /// Move a request to a new status and print the updated request
    Transition {
        /// Request JSON file
        request: PathBuf,
        /// Target status
        #[arg(value_parser = parse_status)]
        target: RequestStatus,
        #[command(flatten)]
        operator: OperatorArgs,
        /// Note to append to the request's internal notes
        #[arg(long)]
        note: Option<String>,
    },
    /// Escalate a request and print the updated request with its event
    Escalate {
        /// Request JSON file
        request: PathBuf,
        /// Why the request needs attention
        #[arg(long)]
        reason: String,
        /// Who it goes to
        #[arg(long, default_value = DEFAULT_ESCALATION_LEVEL)]
        level: String,
        #[command(flatten)]
        operator: OperatorArgs,
    },
    /// Validate a field milestone reported by an agent
    Milestone {
        /// Request JSON file
        request: PathBuf,
        /// `arrived`, `work_started` or `resolved`
        #[arg(value_parser = parse_literal::<Milestone>)]
        milestone: Milestone,
        /// Reporting agent
        #[arg(long)]
        agent_id: String,
    },
    /// Filter a citizen list the way the citizens screen does
    FilterCitizens {
        /// Citizen list JSON file
        citizens: PathBuf,
        /// `verified`, `unverified`, or empty for all
        #[arg(long, default_value = "")]
        verification: String,
        /// Case-insensitive city substring
        #[arg(long, default_value = "")]
        city: String,
    },
    /// Show the SLA policy for a category and priority
    Sla {
        /// Request category (e.g. `pothole`)
        category: String,
        /// `P0` to `P3`
        #[arg(value_parser = parse_literal::<Priority>)]
        priority: Priority,
    },
    /// Compute the dashboard KPIs for a request list
    Kpis {
        /// Request list JSON file
        requests: PathBuf,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Build the live heat-map feed for a request list
    Heatmap {
        /// Request list JSON file
        requests: PathBuf,
        /// Group points into 0.01 degree cells instead of emitting `GeoJSON`
        #[arg(long)]
        buckets: bool,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Monthly request volume and the busiest zones
    Cohorts {
        /// Request list JSON file
        requests: PathBuf,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Open and resolved work per assigned agent
    AgentProductivity {
        /// Request list JSON file
        requests: PathBuf,
        /// Agent list JSON file
        agents: PathBuf,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Request statistics for one citizen
    CitizenStats {
        /// Citizen list JSON file
        citizens: PathBuf,
        /// Request list JSON file
        requests: PathBuf,
        /// Citizen id
        citizen_id: String,
    },
}

/// Credentials of the acting operator.
#[derive(Args)]
#[group(required = true, multiple = true)]
struct OperatorArgs {
    /// Staff admin key
    #[arg(long)]
    staff_key: Option<String>,
    /// Field agent id
    #[arg(long)]
    agent_id: Option<String>,
    /// Act as the automated system
    #[arg(long, conflicts_with_all = ["staff_key", "agent_id"])]
    system: bool,
}

impl OperatorArgs {
    fn actor(&self) -> Actor {
        if self.system {
            return Actor::system();
        }
        actor_from_credentials(&StaticCredentials {
            staff_key: self.staff_key.clone(),
            agent_id: self.agent_id.clone(),
        })
    }
}

/// Dashboard filter bar.
#[derive(Args)]
struct QueryArgs {
    /// Category name
    #[arg(long)]
    category: Option<String>,
    /// Zone id
    #[arg(long)]
    zone: Option<String>,
    /// Earliest creation date (YYYY-MM-DD or ISO 8601)
    #[arg(long)]
    from: Option<String>,
    /// Latest creation date (YYYY-MM-DD or ISO 8601)
    #[arg(long)]
    to: Option<String>,
}

impl QueryArgs {
    fn to_query(&self) -> Result<DashboardQuery, citizen_services_analytics::AnalyticsError> {
        DashboardQuery::from_params(
            self.category.as_deref(),
            self.zone.as_deref(),
            self.from.as_deref(),
            self.to.as_deref(),
        )
    }
}

fn parse_status(value: &str) -> Result<RequestStatus, String> {
    RequestStatus::from_legacy_label(value).ok_or_else(|| format!("unknown status '{value}'"))
}

fn parse_role(value: &str) -> Result<ActorRole, String> {
    parse_literal(value)
}

fn parse_literal<T: FromStr>(value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("unrecognized value '{value}'"))
}

fn load_zones(config: Option<&Path>) -> Result<ZoneResolver, Box<dyn std::error::Error>> {
    Ok(match config {
        Some(path) => ZoneResolver::from_file(path)?,
        None => ZoneResolver::builtin(),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents)?;
    log::debug!("Loaded {}", path.display());
    Ok(value)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Zone { lat, lng, config } => {
            let zones = load_zones(config.as_deref())?;
            println!("{}", zones.resolve_zone(Coordinate::new(lat, lng)));
        }
        Commands::Zones { config } => {
            let zones = load_zones(config.as_deref())?;
            for zone_id in zones.zone_ids() {
                println!("{zone_id}");
            }
        }
        Commands::Transitions { status, role } => {
            let roles = role.map_or_else(|| ActorRole::all().to_vec(), |r| vec![r]);
            for role in roles {
                let next: Vec<String> = allowed_next(status, role)
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                println!("{role:<8} {}", next.join(", "));
            }
        }
        Commands::Transition {
            request,
            target,
            operator,
            note,
        } => {
            let request: ServiceRequest = read_json(&request)?;
            let actor = operator.actor();
            let outcome =
                apply_transition_with_note(&request, target, &actor, note.as_deref(), Utc::now())?;
            if let Some(event) = &outcome.event {
                log::info!("Recorded {:?} by {} at {}", event.event_type, event.by.role, event.at);
            }
            print_json(&outcome.request)?;
        }
        Commands::Escalate {
            request,
            reason,
            level,
            operator,
        } => {
            let request: ServiceRequest = read_json(&request)?;
            let outcome = escalate(&request, &reason, &operator.actor(), &level, Utc::now())?;
            print_json(&serde_json::json!({
                "request": outcome.request,
                "event": outcome.event,
            }))?;
        }
        Commands::Milestone {
            request,
            milestone,
            agent_id,
        } => {
            let request: ServiceRequest = read_json(&request)?;
            let actor = actor_from_credentials(&StaticCredentials::agent(agent_id));
            let event = record_milestone(&request, milestone, &actor)?;
            print_json(&event)?;
        }
        Commands::FilterCitizens {
            citizens,
            verification,
            city,
        } => {
            let citizens: Vec<CitizenProfile> = read_json(&citizens)?;
            let filter = CitizenFilter::from_form(&verification, &city);
            print_json(&apply_filter(&citizens, &filter))?;
        }
        Commands::Sla { category, priority } => {
            print_json(&sla_policy(&category, priority))?;
        }
        Commands::Kpis { requests, query } => {
            let requests: Vec<ServiceRequest> = read_json(&requests)?;
            let selected = query.to_query()?.select(&requests);
            print_json(&kpis(&selected))?;
        }
        Commands::Heatmap {
            requests,
            buckets,
            query,
        } => {
            let requests: Vec<ServiceRequest> = read_json(&requests)?;
            let selected = query.to_query()?.select(&requests);
            let features = heatmap(&selected, Utc::now());
            if buckets {
                print_json(&bucket_points(&features))?;
            } else {
                print_json(&feature_collection(&features))?;
            }
        }
        Commands::Cohorts { requests, query } => {
            let requests: Vec<ServiceRequest> = read_json(&requests)?;
            let selected = query.to_query()?.select(&requests);
            print_json(&cohorts(&selected))?;
        }
        Commands::AgentProductivity {
            requests,
            agents,
            query,
        } => {
            let requests: Vec<ServiceRequest> = read_json(&requests)?;
            let agents: Vec<ServiceAgent> = read_json(&agents)?;
            let selected = query.to_query()?.select(&requests);
            print_json(&agent_productivity(&selected, &agents))?;
        }
        Commands::CitizenStats {
            citizens,
            requests,
            citizen_id,
        } => {
            let citizens: Vec<CitizenProfile> = read_json(&citizens)?;
            let requests: Vec<ServiceRequest> = read_json(&requests)?;
            let citizen = citizens
                .iter()
                .find(|c| c.id == citizen_id)
                .ok_or_else(|| format!("citizen '{citizen_id}' not found"))?;
            print_json(&citizen_statistics(citizen, &requests))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory as _;
        Cli::command().debug_assert();
    }

    #[test]
    fn zone_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["citizen_services", "zone", "-33.86", "151.2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Zone { lat, config: None, .. } if (lat + 33.86).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn status_arguments_accept_display_labels() {
        let cli =
            Cli::try_parse_from(["citizen_services", "transitions", "IN PROGRESS", "--role", "agent"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Transitions {
                status: RequestStatus::InProgress,
                role: Some(ActorRole::Agent),
            }
        ));
        assert!(Cli::try_parse_from(["citizen_services", "transitions", "reopened"]).is_err());
    }

    fn operator(args: &[&str]) -> Actor {
        let mut argv = vec!["citizen_services", "transition", "r.json", "triaged"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Transition { operator, .. } => operator.actor(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn transition_requires_credentials() {
        assert!(Cli::try_parse_from(["citizen_services", "transition", "r.json", "triaged"]).is_err());
        assert!(
            Cli::try_parse_from([
                "citizen_services",
                "transition",
                "r.json",
                "triaged",
                "--role",
                "staff"
            ])
            .is_err()
        );
    }

    #[test]
    fn operator_comes_from_credentials() {
        assert_eq!(operator(&["--staff-key", "k-1"]), Actor::staff("k-1"));
        assert_eq!(operator(&["--agent-id", "agent-a"]), Actor::agent("agent-a"));
        assert_eq!(
            operator(&["--agent-id", "agent-a", "--staff-key", "k-1"]).role,
            ActorRole::Staff
        );
        assert_eq!(operator(&["--system"]), Actor::system());
    }

    #[test]
    fn system_excludes_other_credentials() {
        assert!(
            Cli::try_parse_from([
                "citizen_services",
                "transition",
                "r.json",
                "triaged",
                "--system",
                "--staff-key",
                "k-1"
            ])
            .is_err()
        );
    }

    #[test]
    fn escalate_defaults_to_manager() {
        let cli = Cli::try_parse_from([
            "citizen_services",
            "escalate",
            "r.json",
            "--reason",
            "SLA at risk",
            "--staff-key",
            "k-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Escalate {
                reason,
                level,
                operator,
                ..
            } => {
                assert_eq!(reason, "SLA at risk");
                assert_eq!(level, DEFAULT_ESCALATION_LEVEL);
                assert_eq!(operator.actor(), Actor::staff("k-1"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn report_commands_parse() {
        assert!(matches!(
            Cli::try_parse_from(["citizen_services", "cohorts", "r.json", "--zone", "ZONE-DT-01"])
                .unwrap()
                .command,
            Commands::Cohorts { .. }
        ));
        assert!(matches!(
            Cli::try_parse_from(["citizen_services", "agent-productivity", "r.json", "a.json"])
                .unwrap()
                .command,
            Commands::AgentProductivity { .. }
        ));
        assert!(matches!(
            Cli::try_parse_from(["citizen_services", "citizen-stats", "c.json", "r.json", "c-1"])
                .unwrap()
                .command,
            Commands::CitizenStats { ref citizen_id, .. } if citizen_id == "c-1"
        ));
    }
}
