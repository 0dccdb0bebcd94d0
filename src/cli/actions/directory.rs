use crate::carelink::{
    directory::{Category, DirectoryClient, Listing, SearchFilters, Suggestion},
    location::{Coordinates, Place},
};
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::Write;
use tracing::info;

#[derive(Debug)]
pub struct SearchArgs {
    pub globals: GlobalArgs,
    pub category: Category,
    pub filters: SearchFilters,
    pub near: Option<Coordinates>,
    pub json: bool,
}

#[derive(Debug)]
pub struct SuggestArgs {
    pub globals: GlobalArgs,
    pub term: String,
    pub json: bool,
}

#[derive(Debug)]
pub struct LocateArgs {
    pub globals: GlobalArgs,
    pub coordinates: Coordinates,
    pub json: bool,
}

/// Execute the search action.
/// # Errors
/// Returns an error if configuration is invalid or a request fails.
pub async fn search(args: SearchArgs) -> Result<()> {
    let directory = DirectoryClient::new(args.globals.api_client()?);

    let mut filters = args.filters;
    if let Some(coordinates) = args.near {
        let place = args
            .globals
            .geocoder()?
            .reverse(coordinates)
            .await
            .context("failed to detect location")?;
        let city = place
            .city
            .with_context(|| format!("no city found near {coordinates}"))?;
        info!(%city, "searching near detected city");
        filters.city = Some(city);
    }

    let listings = directory
        .search(args.category, &filters)
        .await
        .with_context(|| format!("failed to search {}", args.category))?;

    let mut out = std::io::stdout();
    if args.json {
        let fields: Vec<_> = listings.iter().map(Listing::fields).collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&fields)?)?;
    } else {
        print_listings(&mut out, args.category, &listings)?;
    }
    Ok(())
}

/// Execute the suggest action.
/// # Errors
/// Returns an error if configuration is invalid or the request fails.
pub async fn suggest(args: SuggestArgs) -> Result<()> {
    let directory = DirectoryClient::new(args.globals.api_client()?);
    let suggestions = directory
        .suggestions(&args.term)
        .await
        .context("failed to fetch suggestions")?;

    let mut out = std::io::stdout();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&suggestions)?)?;
    } else {
        print_suggestions(&mut out, &suggestions)?;
    }
    Ok(())
}

/// Execute the locate action.
/// # Errors
/// Returns an error if the geocoding URL is invalid or the lookup fails.
pub async fn locate(args: LocateArgs) -> Result<()> {
    let place = args
        .globals
        .geocoder()?
        .reverse(args.coordinates)
        .await
        .context("failed to detect location")?;

    let mut out = std::io::stdout();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&place_json(&place))?)?;
    } else {
        print_place(&mut out, &place)?;
    }
    Ok(())
}

fn print_listings<W: Write>(out: &mut W, category: Category, listings: &[Listing]) -> Result<()> {
    if listings.is_empty() {
        writeln!(out, "No {category} found")?;
        return Ok(());
    }

    for listing in listings {
        let mut line = listing.name();
        if let Some(detail) = listing.detail() {
            line.push_str(&format!(" ({detail})"));
        }
        if let Some(location) = listing.location() {
            line.push_str(&format!(" - {location}"));
        }
        if let Some(phone) = listing.phone() {
            line.push_str(&format!(" - {phone}"));
        }
        if let Some(id) = listing.id() {
            line.push_str(&format!(" [{id}]"));
        }
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn print_suggestions<W: Write>(out: &mut W, suggestions: &[Suggestion]) -> Result<()> {
    for suggestion in suggestions {
        match &suggestion.kind {
            Some(kind) => writeln!(out, "{} ({kind})", suggestion.name)?,
            None => writeln!(out, "{}", suggestion.name)?,
        }
    }
    Ok(())
}

fn print_place<W: Write>(out: &mut W, place: &Place) -> Result<()> {
    writeln!(out, "City: {}", place.city.as_deref().unwrap_or("unknown"))?;
    if let Some(state) = &place.state {
        writeln!(out, "State: {state}")?;
    }
    if let Some(postcode) = &place.postcode {
        writeln!(out, "Postcode: {postcode}")?;
    }
    if let Some(display_name) = &place.display_name {
        writeln!(out, "Address: {display_name}")?;
    }
    Ok(())
}

fn place_json(place: &Place) -> Value {
    json!({
        "city": place.city,
        "state": place.state,
        "postcode": place.postcode,
        "displayName": place.display_name,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn listings_are_summarised_per_line() {
        let listings = vec![
            Listing::from_value(json!({
                "_id": "d1",
                "name": "Dr. Kulkarni",
                "specialization": "Cardiology",
                "city": "Pune",
                "phone": "020-1234"
            }))
            .unwrap(),
            Listing::from_value(json!({ "title": "Night Ambulance" })).unwrap(),
        ];

        let mut out = Vec::new();
        print_listings(&mut out, Category::Doctors, &listings).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Dr. Kulkarni (Cardiology) - Pune - 020-1234 [d1]\nNight Ambulance\n"
        );
    }

    #[test]
    fn empty_results_are_reported() {
        let mut out = Vec::new();
        print_listings(&mut out, Category::Labs, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No labs found\n");
    }

    #[test]
    fn suggestions_show_kind() {
        let suggestions = vec![
            Suggestion {
                name: "Cardiology".to_string(),
                kind: None,
                id: None,
            },
            Suggestion {
                name: "City Diagnostics".to_string(),
                kind: Some("lab".to_string()),
                id: Some("l1".to_string()),
            },
        ];
        let mut out = Vec::new();
        print_suggestions(&mut out, &suggestions).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Cardiology\nCity Diagnostics (lab)\n"
        );
    }

    #[test]
    fn place_output() {
        let place = Place {
            city: Some("Pune".to_string()),
            state: Some("Maharashtra".to_string()),
            postcode: None,
            display_name: None,
        };
        let mut out = Vec::new();
        print_place(&mut out, &place).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "City: Pune\nState: Maharashtra\n"
        );
        assert_eq!(place_json(&place)["postcode"], Value::Null);
    }
}
