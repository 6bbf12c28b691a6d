use clap::{Parser, Subcommand};
use pcx_core::config::{contact_config_from_lookup, core_config_from_lookup};
use pcx_core::constants::ENV_BASE_URL;
use pcx_core::{
    contact_attribute_filter, Attribute, AttributeTypeUuid, ContactConfig, PatientUuid,
    PATIENT_CUSTOM_REPRESENTATION,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pcx")]
#[command(about = "Patient contact attribute lookup")]
struct Cli {
    /// Patient service base URL (overrides PCX_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every person attribute of a patient
    Attributes {
        /// Patient UUID
        patient_uuid: String,
        /// Print JSON instead of one line per attribute
        #[arg(long)]
        json: bool,
    },
    /// List the contact attributes of a patient
    Contacts {
        /// Patient UUID
        patient_uuid: String,
        /// Configuration file with `contactAttributeType` (overrides PCX_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Contact attribute type UUID, repeatable (overrides any configuration file)
        #[arg(long = "type")]
        types: Vec<String>,
        /// Print JSON instead of one line per attribute
        #[arg(long)]
        json: bool,
    },
    /// Print the representation string sent with patient reads
    Representation,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let lookup = |key: &str| {
        if key == ENV_BASE_URL {
            if let Some(base_url) = &cli.base_url {
                return Some(base_url.clone());
            }
        }
        std::env::var(key).ok()
    };

    match cli.command {
        Some(Commands::Attributes {
            ref patient_uuid,
            json,
        }) => {
            let patient = PatientUuid::new(patient_uuid)?;
            let filter = contact_attribute_filter(&core_config_from_lookup(lookup)?)?;

            let result = filter.fetcher().fetch_patient_attributes(&patient).await;
            if let Some(err) = result.error {
                anyhow::bail!("Error reading attributes for {}: {}", patient, err);
            }
            print_attributes(&result.attributes, json)?;
        }
        Some(Commands::Contacts {
            ref patient_uuid,
            ref config,
            ref types,
            json,
        }) => {
            let patient = PatientUuid::new(patient_uuid)?;
            let contact_config = resolve_contact_config(config.clone(), types, lookup)?;
            let filter = contact_attribute_filter(&core_config_from_lookup(lookup)?)?;

            let result = filter
                .filter_contact_attributes(&patient, contact_config.contact_attribute_types())
                .await;
            if result.contact_attributes.is_empty() && !json {
                println!("No contact attributes found.");
            } else {
                print_attributes(&result.contact_attributes, json)?;
            }
        }
        Some(Commands::Representation) => {
            println!("{}", PATIENT_CUSTOM_REPRESENTATION);
        }
        None => {
            println!("Use 'pcx --help' for commands");
        }
    }

    Ok(())
}

/// Types given on the command line win, then `--config`, then `PCX_CONFIG`.
fn resolve_contact_config(
    config: Option<PathBuf>,
    types: &[String],
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ContactConfig> {
    if !types.is_empty() {
        let types = types
            .iter()
            .map(AttributeTypeUuid::new)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ContactConfig::new(Some(types)));
    }

    match config {
        Some(path) => Ok(ContactConfig::load(&path)?),
        None => Ok(contact_config_from_lookup(lookup)?),
    }
}

fn print_attributes(attributes: &[Attribute], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(attributes)?);
        return Ok(());
    }
    for attribute in attributes {
        println!("{}", format_attribute(attribute));
    }
    Ok(())
}

/// `<type>: <value>`, naming the type by its display text when the server sent one.
fn format_attribute(attribute: &Attribute) -> String {
    let label = attribute
        .attribute_type
        .display
        .as_deref()
        .unwrap_or(&attribute.attribute_type.uuid);

    let value = match &attribute.value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => match map.get("display") {
            Some(serde_json::Value::String(display)) => display.clone(),
            _ => attribute.value.to_string(),
        },
        other => other.to_string(),
    };

    format!("{label}: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(json: &str) -> Attribute {
        serde_json::from_str(json).expect("valid attribute")
    }

    #[test]
    fn formats_text_value_with_type_display() {
        let a = attribute(
            r#"{"value":"555-1000","attributeType":{"uuid":"phone","display":"Contact Phone Number"}}"#,
        );
        assert_eq!(format_attribute(&a), "Contact Phone Number: 555-1000");
    }

    #[test]
    fn falls_back_to_type_uuid_and_concept_display() {
        let a = attribute(
            r#"{"value":{"uuid":"c-1","display":"Yes"},"attributeType":{"uuid":"consent"}}"#,
        );
        assert_eq!(format_attribute(&a), "consent: Yes");
    }

    #[test]
    fn command_line_types_override_configuration() {
        let cfg = resolve_contact_config(
            Some(PathBuf::from("/does/not/exist.yaml")),
            &["phone".to_string()],
            |_| None,
        )
        .expect("types win without touching the file");
        assert_eq!(
            cfg.contact_attribute_types().map(|t| t[0].as_str()),
            Some("phone")
        );
    }

    #[test]
    fn blank_type_is_rejected() {
        assert!(resolve_contact_config(None, &[" ".to_string()], |_| None).is_err());
    }

    #[test]
    fn no_sources_means_no_types() {
        let cfg = resolve_contact_config(None, &[], |_| None).expect("empty config");
        assert!(cfg.contact_attribute_types().is_none());
    }

    #[test]
    fn cli_parses_repeated_types() {
        let cli = Cli::try_parse_from([
            "pcx", "contacts", "abc-123", "--type", "phone", "--type", "email",
        ])
        .expect("valid arguments");
        match cli.command {
            Some(Commands::Contacts { types, .. }) => assert_eq!(types, vec!["phone", "email"]),
            _ => panic!("expected contacts command"),
        }
    }
}
