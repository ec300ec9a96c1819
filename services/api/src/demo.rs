use crate::infra::Services;
use clap::Args;
use valuation_desk::api::ApiError;
use valuation_desk::error::AppError;
use valuation_desk::geo::GeoPoint;
use valuation_desk::identity::{
    Caller, ClientKind, IdentityRepository, NewClient, NewUser, User, UserId,
};
use valuation_desk::reports::{
    NewReportTemplate, NewToWhomType, RecipientKind, TemplateStyling, TemplateType,
};
use valuation_desk::sketches::{NearbyValuation, DEFAULT_NEARBY_RADIUS};
use valuation_desk::store::RepositoryError;
use valuation_desk::valuations::{
    NewValuation, PropertyDetails, ReportDetails, ValuationResults, ValuationStatus,
};

#[derive(Args, Debug, Default)]
pub(crate) struct SeedArgs {
    /// Also load the demo staff, clients, templates, and valuations
    #[arg(long)]
    pub(crate) with_demo: bool,
}

#[derive(Args, Debug)]
pub(crate) struct NearbyArgs {
    /// Latitude of the search centre
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) latitude: f64,
    /// Longitude of the search centre
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) longitude: f64,
    /// Search radius in meters (100 to 10000)
    #[arg(long)]
    pub(crate) radius: Option<u32>,
}

/// Staff created by [`seed_demo`], with the bearer token each one is reachable under.
pub(crate) struct DemoDataset {
    pub(crate) staff: Vec<(String, User)>,
    pub(crate) valuations: usize,
}

impl DemoDataset {
    pub(crate) fn tokens(&self) -> Vec<(String, UserId)> {
        self.staff
            .iter()
            .map(|(token, user)| (token.clone(), user.id))
            .collect()
    }
}

const DEMO_STAFF: [(&str, &str, &str, &str); 4] = [
    ("Faisal Omar", "faisal.omar@valuation.test", "general-manager", "demo-manager"),
    ("Lina Farouk", "lina.farouk@valuation.test", "valuation-supervisor", "demo-supervisor"),
    ("Reem Aziz", "reem.aziz@valuation.test", "senior-valuator", "demo-valuator"),
    ("Maha Ali", "maha.ali@valuation.test", "data-entry", "demo-entry"),
];

/// Riyadh districts used for the demo valuations: (district, property type, north, east, value).
const DEMO_SITES: [(&str, &str, f64, f64, f64); 5] = [
    ("Al Olaya", "apartment", 0.0, 0.0, 850_000.0),
    ("Al Olaya", "villa", 0.002, 0.001, 2_300_000.0),
    ("Al Sulimaniyah", "office", 0.006, -0.002, 4_100_000.0),
    ("Al Malaz", "land", -0.03, 0.04, 1_200_000.0),
    ("Al Nakheel", "villa", 0.05, -0.03, 3_050_000.0),
];

const DEMO_CENTER: GeoPoint = GeoPoint {
    latitude: 24.7136,
    longitude: 46.6753,
};

/// Seeds roles and permissions, then demo staff, a client, report templates, and valuations.
pub(crate) fn seed_demo(services: &Services) -> Result<DemoDataset, AppError> {
    services.identity.seed_defaults()?;

    let mut staff = Vec::with_capacity(DEMO_STAFF.len());
    for (name, email, slug, token) in DEMO_STAFF {
        let role = services
            .store
            .role_by_slug(slug)?
            .ok_or(RepositoryError::NotFound("role"))?;
        let user = services.identity.create_employee(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            job_title: Some(role.name_en.clone()),
            role_ids: vec![role.id],
        })?;
        staff.push((token.to_string(), user));
    }

    let client = services.identity.create_client(NewClient {
        name: "Gulf Housing Fund".to_string(),
        email: Some("valuations@gulfhousing.test".to_string()),
        phone: Some("0501234567".to_string()),
        kind: ClientKind::Institution,
        address: Some("King Fahd Rd, Riyadh".to_string()),
    })?;

    let general = services
        .reports
        .create_template(demo_template("Standard Valuation Report", TemplateType::General))
        .map_err(ApiError::from)?;
    let bank_template = services
        .reports
        .create_template(NewReportTemplate {
            styling: TemplateStyling {
                margin_top: Some(25),
                ..TemplateStyling::default()
            },
            ..demo_template("Bank Mortgage Report", TemplateType::Bank)
        })
        .map_err(ApiError::from)?;
    let bank = services
        .reports
        .create_to_whom_type(NewToWhomType {
            name_en: "Commercial Bank".to_string(),
            name_ar: "بنك تجاري".to_string(),
            kind: RecipientKind::Bank,
            template_id: Some(bank_template.id),
            description: None,
        })
        .map_err(ApiError::from)?;

    let valuator = resolve(services, &staff[2].1)?;
    let mut valuations = 0;
    for (index, (district, property_type, north, east, value)) in DEMO_SITES.into_iter().enumerate()
    {
        let addressed = index % 2 == 0;
        services
            .valuations
            .create(
                &valuator,
                NewValuation {
                    status: Some(if index == 0 {
                        ValuationStatus::Draft
                    } else {
                        ValuationStatus::Pending
                    }),
                    client_id: Some(client.id),
                    to_whom_type_id: addressed.then_some(bank.id),
                    property: PropertyDetails {
                        property_type: Some(property_type.to_string()),
                        city: Some("Riyadh".to_string()),
                        district: Some(district.to_string()),
                        land_area: Some(400.0 + 100.0 * index as f64),
                        building_area: (property_type != "land").then_some(320.0),
                        ..PropertyDetails::default()
                    },
                    results: ValuationResults {
                        final_value: Some(value),
                        ..ValuationResults::default()
                    },
                    report: ReportDetails {
                        reference_number: Some(format!("DEMO-{:03}", index + 1)),
                        valuation_purpose: Some("mortgage".to_string()),
                        ..ReportDetails::default()
                    },
                    latitude: Some(DEMO_CENTER.latitude + north),
                    longitude: Some(DEMO_CENTER.longitude + east),
                    ..NewValuation::default()
                },
            )
            .map_err(ApiError::from)?;
        valuations += 1;
    }

    tracing::info!(
        staff = staff.len(),
        valuations,
        general_template = %general.id,
        "demo dataset seeded"
    );
    Ok(DemoDataset { staff, valuations })
}

fn demo_template(name: &str, template_type: TemplateType) -> NewReportTemplate {
    NewReportTemplate {
        name_en: name.to_string(),
        name_ar: name.to_string(),
        template_type,
        to_whom_type_id: None,
        description: None,
        styling: TemplateStyling::default(),
        is_active: true,
    }
}

fn resolve(services: &Services, user: &User) -> Result<Caller, AppError> {
    Ok(services
        .identity
        .resolve_caller(user.id)?
        .ok_or(RepositoryError::NotFound("user"))?)
}

pub(crate) fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let services = Services::in_memory();
    let summary = services.identity.seed_defaults()?;
    println!(
        "Seeded {} permissions across {} roles",
        summary.permissions, summary.roles
    );

    for view in services.identity.roles()? {
        println!(
            "  [{}] {:<22} {:>2} permissions",
            view.role.level,
            view.role.slug,
            view.permissions.len()
        );
    }

    if args.with_demo {
        let dataset = seed_demo(&services)?;
        println!("\nDemo staff");
        for (token, user) in &dataset.staff {
            println!("  {:<14} {} <{}>", token, user.name, user.email);
        }
        println!("Demo valuations: {}", dataset.valuations);
    }
    Ok(())
}

pub(crate) fn run_nearby(args: NearbyArgs) -> Result<(), AppError> {
    let services = Services::in_memory();
    seed_demo(&services)?;

    let radius = args.radius.unwrap_or(DEFAULT_NEARBY_RADIUS);
    let found = services
        .sketches
        .nearby(
            GeoPoint::new(args.latitude, args.longitude),
            Some(radius),
            None,
        )
        .map_err(ApiError::from)?;

    println!(
        "{} valuation(s) within {} m of ({:.4}, {:.4})",
        found.len(),
        radius,
        args.latitude,
        args.longitude
    );
    for entry in &found {
        println!("  {}", describe(entry));
    }
    Ok(())
}

fn describe(entry: &NearbyValuation) -> String {
    let value = entry
        .final_value
        .map_or_else(|| "no value".to_string(), |value| format!("{value:.0} SAR"));
    format!(
        "{:>7.1} m  {}  {:<10} {}",
        entry.distance_meters,
        entry.valuation_number,
        entry.property_type.as_deref().unwrap_or("unspecified"),
        value
    )
}
