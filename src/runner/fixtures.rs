use super::context::RunContext;
use crate::utils::config::Config;
use chrono::{Duration, NaiveDate, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use uuid::Uuid;

/// Seed a fresh run context with configuration values and per-run test data.
///
/// Emails embed the run id so repeated runs against the same tenant do not
/// collide on unique constraints.
pub fn seed_vars(context: &mut RunContext, config: &Config) {
    context.set_var("baseUrl", &config.base_url);
    context.set_var("tenantId", &config.tenant_id);
    context.set_var("email", &config.email);
    context.set_var("password", &config.password);

    let run_id = Uuid::new_v4().simple().to_string()[..8].to_string();
    context.set_var("runId", &run_id);

    let mut rng = rand::thread_rng();

    let provider_first: String = FirstName().fake();
    let provider_last: String = LastName().fake();
    context.set_var("providerFirstName", &provider_first);
    context.set_var("providerLastName", &provider_last);
    context.set_var("providerEmail", &tagged_email(SafeEmail().fake(), &run_id));
    context.set_var("providerPhone", &phone_number(&mut rng));
    context.set_var(
        "providerNpi",
        &format!("1{:09}", rng.gen_range(0..1_000_000_000u32)),
    );

    let patient_first: String = FirstName().fake();
    let patient_last: String = LastName().fake();
    context.set_var("patientFirstName", &patient_first);
    context.set_var("patientLastName", &patient_last);
    context.set_var("patientEmail", &tagged_email(SafeEmail().fake(), &run_id));
    context.set_var("patientPhone", &phone_number(&mut rng));
    context.set_var(
        "patientDateOfBirth",
        &date_of_birth(&mut rng).format("%Y-%m-%d").to_string(),
    );

    let appointment_day = (Utc::now() + Duration::days(1)).date_naive();
    context.set_var(
        "appointmentDate",
        &appointment_day.format("%Y-%m-%d").to_string(),
    );
    context.set_var(
        "appointmentWeekday",
        &appointment_day.format("%A").to_string().to_lowercase(),
    );
}

fn tagged_email(email: String, run_id: &str) -> String {
    match email.split_once('@') {
        Some((user, domain)) => format!("{}+{}@{}", user, run_id, domain),
        None => format!("{}+{}@example.com", email, run_id),
    }
}

fn phone_number<R: Rng>(rng: &mut R) -> String {
    format!("555{:07}", rng.gen_range(0..10_000_000u32))
}

fn date_of_birth<R: Rng>(rng: &mut R) -> NaiveDate {
    let year = rng.gen_range(1950..2005);
    let ordinal = rng.gen_range(1..=365);
    NaiveDate::from_yo_opt(year, ordinal).unwrap_or(NaiveDate::MIN)
}
