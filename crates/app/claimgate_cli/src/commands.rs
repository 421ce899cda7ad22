use std::io::Read;
use std::path::Path;

use claimgate_core::{Checkpoint, Claims, User};
use log::{debug, info};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::Result;
use crate::cli::{Format, InspectArgs};

/// Everything `inspect` prints about a user.
#[derive(Debug, Serialize)]
struct Report<'a> {
    claims: &'a Claims,
    full: &'a Map<String, Value>,
    reduced: &'a Map<String, Value>,
    roles: Vec<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    checkpoints: &'a [Checkpoint],
    #[serde(skip_serializing_if = "is_empty")]
    frontend_links: &'a [String],
    valid: bool,
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    if input == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read(input)?)
    }
}

fn load_user(input: &Path) -> Result<User> {
    let data = read_input(input)?;
    let user = User::from_json_slice(&data)?;
    debug!("loaded claims from {}", input.display());
    Ok(user)
}

fn render<T: Serialize>(value: &T, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    })
}

pub fn inspect(args: &InspectArgs) -> Result<()> {
    let mut user = load_user(&args.input)?;

    let valid = user.validate().is_ok();
    if args.check_expiry {
        user.validate()?;
    }

    let directives: Vec<String> = args
        .checkpoints
        .iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    if !directives.is_empty() {
        user.checkpoints = Checkpoint::parse_many(directives)?;
        info!("attached {} checkpoint(s)", user.checkpoints.len());
    }
    if !args.links.is_empty() {
        user.add_frontend_links(args.links.clone())?;
    }

    let report = Report {
        claims: user.claims(),
        full: user.as_map(),
        reduced: user.data(),
        roles: user.role_index().sorted(),
        checkpoints: &user.checkpoints,
        frontend_links: user.frontend_links(),
        valid,
    };
    println!("{}", render(&report, args.format)?);
    Ok(())
}

pub fn claim(input: &Path, field: &str) -> Result<()> {
    let user = load_user(input)?;
    println!("{}", user.claim_value_by_field(field));
    Ok(())
}

/// Returns whether the role check passed.
pub fn has_role(input: &Path, roles: &[String], all: bool) -> Result<bool> {
    let user = load_user(input)?;
    let ok = if all {
        user.has_roles(roles)
    } else {
        user.has_role(roles)
    };
    info!("role check ({}) {:?}: {}", if all { "all" } else { "any" }, roles, ok);
    Ok(ok)
}

pub fn checkpoints(directives: &[String], format: Format) -> Result<()> {
    let checkpoints = Checkpoint::parse_many(directives.to_vec())?;
    println!("{}", render(&checkpoints, format)?);
    Ok(())
}
