//! SurrealDB implementation of [`DestinationRepository`].
//!
//! The one-to-one configuration rows (`destination_data`,
//! `destination_flux`) use the destination UUID as their record id, so
//! replacing them is a single UPSERT. Dates are stored as ISO strings.

use chrono::{DateTime, NaiveDate, Utc};
use greetnet_core::error::GreetnetResult;
use greetnet_core::models::destination::{
    CreateDestination, Destination, DestinationData, DestinationFlux, UpdateDestination,
};
use greetnet_core::repository::{DestinationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::cluster::parse_status;

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Migration(format!("invalid {field} UUID: {e}")))
}

fn parse_opt_uuid(value: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(&v, field)).transpose()
}

fn parse_opt_date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>, DbError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|e| DbError::Migration(format!("invalid {field} date: {e}")))
        })
        .transpose()
}

fn date_to_string(value: Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.format("%Y-%m-%d").to_string())
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct DestinationRow {
    record_id: String,
    cluster_id: String,
    code: String,
    parent_code: Option<String>,
    iga_code: Option<String>,
    name: String,
    description: String,
    address: String,
    region: String,
    country: String,
    logo_path: Option<String>,
    email_label: String,
    status: String,
    manager: Option<String>,
    referent: Option<String>,
    matcher: Option<String>,
    matcher_alt: Option<String>,
    financier: Option<String>,
    min_places: u32,
    max_places: u32,
    min_interests: u32,
    max_interests: u32,
    require_stay_dates: bool,
    dispersion_days: u32,
    notification_email: Option<String>,
    reply_email: Option<String>,
    accepts_disability: bool,
    disability_notice: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DestinationRow {
    fn try_into_destination(self) -> Result<Destination, DbError> {
        Ok(Destination {
            id: parse_uuid(&self.record_id, "destination")?,
            cluster_id: parse_uuid(&self.cluster_id, "cluster_id")?,
            code: self.code,
            parent_code: self.parent_code,
            iga_code: self.iga_code,
            name: self.name,
            description: self.description,
            address: self.address,
            region: self.region,
            country: self.country,
            logo_path: self.logo_path,
            email_label: self.email_label,
            status: parse_status(&self.status)?,
            manager: parse_opt_uuid(self.manager, "manager")?,
            referent: parse_opt_uuid(self.referent, "referent")?,
            matcher: parse_opt_uuid(self.matcher, "matcher")?,
            matcher_alt: parse_opt_uuid(self.matcher_alt, "matcher_alt")?,
            financier: parse_opt_uuid(self.financier, "financier")?,
            min_places: self.min_places,
            max_places: self.max_places,
            min_interests: self.min_interests,
            max_interests: self.max_interests,
            require_stay_dates: self.require_stay_dates,
            dispersion_days: self.dispersion_days,
            notification_email: self.notification_email,
            reply_email: self.reply_email,
            accepts_disability: self.accepts_disability,
            disability_notice: self.disability_notice,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct DestinationDataRow {
    destination_id: String,
    donation_recipient: Option<String>,
    donation_amount: Option<u32>,
    paypal_url: Option<String>,
    donation_text: Option<String>,
    facebook_url: Option<String>,
    instagram_url: Option<String>,
    comm_langs: Vec<String>,
    spoken_langs: Vec<String>,
    default_lang: String,
    auto_handling: bool,
    request_wall_open: bool,
    ask_visitor_comment: bool,
    visitor_comment_prompt: Option<String>,
    closure_active: bool,
    closure_start: Option<String>,
    closure_end: Option<String>,
    closure_text: Option<String>,
    closure_max_participants: u32,
    signature_name: Option<String>,
    signature_url: Option<String>,
    signature_social_label_1: Option<String>,
    signature_social_url_1: Option<String>,
    signature_social_label_2: Option<String>,
    signature_social_url_2: Option<String>,
    signature_tagline: Option<String>,
    footer_title: Option<String>,
    footer_text: Option<String>,
    footer_start: Option<String>,
    footer_end: Option<String>,
}

impl DestinationDataRow {
    fn try_into_data(self) -> Result<DestinationData, DbError> {
        Ok(DestinationData {
            destination_id: parse_uuid(&self.destination_id, "destination_id")?,
            donation_recipient: self.donation_recipient,
            donation_amount: self.donation_amount,
            paypal_url: self.paypal_url,
            donation_text: self.donation_text,
            facebook_url: self.facebook_url,
            instagram_url: self.instagram_url,
            comm_langs: self.comm_langs,
            spoken_langs: self.spoken_langs,
            default_lang: self.default_lang,
            auto_handling: self.auto_handling,
            request_wall_open: self.request_wall_open,
            ask_visitor_comment: self.ask_visitor_comment,
            visitor_comment_prompt: self.visitor_comment_prompt,
            closure_active: self.closure_active,
            closure_start: parse_opt_date(self.closure_start, "closure_start")?,
            closure_end: parse_opt_date(self.closure_end, "closure_end")?,
            closure_text: self.closure_text,
            closure_max_participants: self.closure_max_participants,
            signature_name: self.signature_name,
            signature_url: self.signature_url,
            signature_social_label_1: self.signature_social_label_1,
            signature_social_url_1: self.signature_social_url_1,
            signature_social_label_2: self.signature_social_label_2,
            signature_social_url_2: self.signature_social_url_2,
            signature_tagline: self.signature_tagline,
            footer_title: self.footer_title,
            footer_text: self.footer_text,
            footer_start: parse_opt_date(self.footer_start, "footer_start")?,
            footer_end: parse_opt_date(self.footer_end, "footer_end")?,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct DestinationFluxRow {
    destination_id: String,
    early_mail_frequency: u32,
    early_confirmation_days: u32,
    treatment_days: u32,
    urgency_days: u32,
    min_organisation_days: u32,
    greeter_reply_deadline: u32,
    greeter_reminder_frequency: u32,
    visitor_reply_deadline: u32,
    visitor_reminder_frequency: u32,
    pre_walk_reminder_days: u32,
    manual_entry_days: u32,
    report_deadline: u32,
    report_reminder_frequency: u32,
    review_request_days: u32,
    review_reminder_frequency: u32,
    review_deadline: u32,
    retention_days: u32,
}

impl DestinationFluxRow {
    fn try_into_flux(self) -> Result<DestinationFlux, DbError> {
        Ok(DestinationFlux {
            destination_id: parse_uuid(&self.destination_id, "destination_id")?,
            early_mail_frequency: self.early_mail_frequency,
            early_confirmation_days: self.early_confirmation_days,
            treatment_days: self.treatment_days,
            urgency_days: self.urgency_days,
            min_organisation_days: self.min_organisation_days,
            greeter_reply_deadline: self.greeter_reply_deadline,
            greeter_reminder_frequency: self.greeter_reminder_frequency,
            visitor_reply_deadline: self.visitor_reply_deadline,
            visitor_reminder_frequency: self.visitor_reminder_frequency,
            pre_walk_reminder_days: self.pre_walk_reminder_days,
            manual_entry_days: self.manual_entry_days,
            report_deadline: self.report_deadline,
            report_reminder_frequency: self.report_reminder_frequency,
            review_request_days: self.review_request_days,
            review_reminder_frequency: self.review_reminder_frequency,
            review_deadline: self.review_deadline,
            retention_days: self.retention_days,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Destination repository.
#[derive(Clone)]
pub struct SurrealDestinationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDestinationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_one(&self, query: &str, bind: (&'static str, String)) -> GreetnetResult<Destination> {
        let key = bind.1.clone();
        let mut result = self
            .db
            .query(query)
            .bind(bind)
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DestinationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "destination".into(),
            id: key,
        })?;

        Ok(row.try_into_destination()?)
    }
}

impl<C: Connection> DestinationRepository for SurrealDestinationRepository<C> {
    async fn create(&self, input: CreateDestination) -> GreetnetResult<Destination> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('destination', $id) SET \
                 cluster_id = $cluster_id, code = $code, \
                 parent_code = $parent_code, iga_code = $iga_code, \
                 name = $name, description = $description, \
                 address = $address, region = $region, \
                 country = $country, logo_path = $logo_path, \
                 email_label = $email_label, status = $status, \
                 manager = $manager, referent = $referent, \
                 matcher = $matcher, matcher_alt = $matcher_alt, \
                 financier = $financier, \
                 min_places = $min_places, max_places = $max_places, \
                 min_interests = $min_interests, \
                 max_interests = $max_interests, \
                 require_stay_dates = $require_stay_dates, \
                 dispersion_days = $dispersion_days, \
                 notification_email = $notification_email, \
                 reply_email = $reply_email, \
                 accepts_disability = $accepts_disability, \
                 disability_notice = $disability_notice",
            )
            .bind(("id", id_str.clone()))
            .bind(("cluster_id", input.cluster_id.to_string()))
            .bind(("code", input.code.to_uppercase()))
            .bind(("parent_code", input.parent_code.map(|c| c.to_uppercase())))
            .bind(("iga_code", input.iga_code.map(|c| c.to_uppercase())))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("address", input.address))
            .bind(("region", input.region))
            .bind(("country", input.country))
            .bind(("logo_path", input.logo_path))
            .bind(("email_label", input.email_label))
            .bind(("status", input.status.as_str().to_string()))
            .bind(("manager", input.manager.map(|u| u.to_string())))
            .bind(("referent", input.referent.map(|u| u.to_string())))
            .bind(("matcher", input.matcher.map(|u| u.to_string())))
            .bind(("matcher_alt", input.matcher_alt.map(|u| u.to_string())))
            .bind(("financier", input.financier.map(|u| u.to_string())))
            .bind(("min_places", input.min_places))
            .bind(("max_places", input.max_places))
            .bind(("min_interests", input.min_interests))
            .bind(("max_interests", input.max_interests))
            .bind(("require_stay_dates", input.require_stay_dates))
            .bind(("dispersion_days", input.dispersion_days))
            .bind(("notification_email", input.notification_email))
            .bind(("reply_email", input.reply_email))
            .bind(("accepts_disability", input.accepts_disability))
            .bind(("disability_notice", input.disability_notice))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("destination", e))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> GreetnetResult<Destination> {
        self.fetch_one(
            "SELECT meta::id(id) AS record_id, * \
             FROM type::record('destination', $id)",
            ("id", id.to_string()),
        )
        .await
    }

    async fn get_by_code(&self, code: &str) -> GreetnetResult<Destination> {
        self.fetch_one(
            "SELECT meta::id(id) AS record_id, * FROM destination \
             WHERE code = $code",
            ("code", code.to_uppercase()),
        )
        .await
    }

    async fn update(&self, id: Uuid, input: UpdateDestination) -> GreetnetResult<Destination> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.parent_code.is_some() {
            sets.push("parent_code = $parent_code");
        }
        if input.iga_code.is_some() {
            sets.push("iga_code = $iga_code");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.region.is_some() {
            sets.push("region = $region");
        }
        if input.country.is_some() {
            sets.push("country = $country");
        }
        if input.logo_path.is_some() {
            sets.push("logo_path = $logo_path");
        }
        if input.email_label.is_some() {
            sets.push("email_label = $email_label");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.manager.is_some() {
            sets.push("manager = $manager");
        }
        if input.referent.is_some() {
            sets.push("referent = $referent");
        }
        if input.matcher.is_some() {
            sets.push("matcher = $matcher");
        }
        if input.matcher_alt.is_some() {
            sets.push("matcher_alt = $matcher_alt");
        }
        if input.financier.is_some() {
            sets.push("financier = $financier");
        }
        if input.min_places.is_some() {
            sets.push("min_places = $min_places");
        }
        if input.max_places.is_some() {
            sets.push("max_places = $max_places");
        }
        if input.min_interests.is_some() {
            sets.push("min_interests = $min_interests");
        }
        if input.max_interests.is_some() {
            sets.push("max_interests = $max_interests");
        }
        if input.require_stay_dates.is_some() {
            sets.push("require_stay_dates = $require_stay_dates");
        }
        if input.dispersion_days.is_some() {
            sets.push("dispersion_days = $dispersion_days");
        }
        if input.notification_email.is_some() {
            sets.push("notification_email = $notification_email");
        }
        if input.reply_email.is_some() {
            sets.push("reply_email = $reply_email");
        }
        if input.accepts_disability.is_some() {
            sets.push("accepts_disability = $accepts_disability");
        }
        if input.disability_notice.is_some() {
            sets.push("disability_notice = $disability_notice");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('destination', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(parent_code) = input.parent_code {
            builder = builder.bind(("parent_code", parent_code.map(|c| c.to_uppercase())));
        }
        if let Some(iga_code) = input.iga_code {
            builder = builder.bind(("iga_code", iga_code.map(|c| c.to_uppercase())));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(region) = input.region {
            builder = builder.bind(("region", region));
        }
        if let Some(country) = input.country {
            builder = builder.bind(("country", country));
        }
        if let Some(logo_path) = input.logo_path {
            builder = builder.bind(("logo_path", logo_path));
        }
        if let Some(email_label) = input.email_label {
            builder = builder.bind(("email_label", email_label));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(manager) = input.manager {
            builder = builder.bind(("manager", manager.map(|u| u.to_string())));
        }
        if let Some(referent) = input.referent {
            builder = builder.bind(("referent", referent.map(|u| u.to_string())));
        }
        if let Some(matcher) = input.matcher {
            builder = builder.bind(("matcher", matcher.map(|u| u.to_string())));
        }
        if let Some(matcher_alt) = input.matcher_alt {
            builder = builder.bind(("matcher_alt", matcher_alt.map(|u| u.to_string())));
        }
        if let Some(financier) = input.financier {
            builder = builder.bind(("financier", financier.map(|u| u.to_string())));
        }
        if let Some(min_places) = input.min_places {
            builder = builder.bind(("min_places", min_places));
        }
        if let Some(max_places) = input.max_places {
            builder = builder.bind(("max_places", max_places));
        }
        if let Some(min_interests) = input.min_interests {
            builder = builder.bind(("min_interests", min_interests));
        }
        if let Some(max_interests) = input.max_interests {
            builder = builder.bind(("max_interests", max_interests));
        }
        if let Some(require_stay_dates) = input.require_stay_dates {
            builder = builder.bind(("require_stay_dates", require_stay_dates));
        }
        if let Some(dispersion_days) = input.dispersion_days {
            builder = builder.bind(("dispersion_days", dispersion_days));
        }
        if let Some(notification_email) = input.notification_email {
            builder = builder.bind(("notification_email", notification_email));
        }
        if let Some(reply_email) = input.reply_email {
            builder = builder.bind(("reply_email", reply_email));
        }
        if let Some(accepts_disability) = input.accepts_disability {
            builder = builder.bind(("accepts_disability", accepts_disability));
        }
        if let Some(disability_notice) = input.disability_notice {
            builder = builder.bind(("disability_notice", disability_notice));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::from_write("destination", e))?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> GreetnetResult<()> {
        let id_str = id.to_string();

        self.db
            .query(
                "DELETE type::record('destination', $id); \
                 DELETE type::record('destination_data', $id); \
                 DELETE type::record('destination_flux', $id)",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_cluster(
        &self,
        cluster_id: Uuid,
        pagination: Pagination,
    ) -> GreetnetResult<PaginatedResult<Destination>> {
        let cluster_id_str = cluster_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM destination \
                 WHERE cluster_id = $cluster_id GROUP ALL",
            )
            .bind(("cluster_id", cluster_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM destination \
                 WHERE cluster_id = $cluster_id \
                 ORDER BY code ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("cluster_id", cluster_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DestinationRow> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_destination())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_by_cluster(&self, cluster_id: Uuid) -> GreetnetResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM destination \
                 WHERE cluster_id = $cluster_id GROUP ALL",
            )
            .bind(("cluster_id", cluster_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn get_data(&self, destination_id: Uuid) -> GreetnetResult<Option<DestinationData>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('destination_data', $id)")
            .bind(("id", destination_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DestinationDataRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(DestinationDataRow::try_into_data)
            .transpose()?)
    }

    async fn upsert_data(&self, data: DestinationData) -> GreetnetResult<DestinationData> {
        let id_str = data.destination_id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('destination_data', $id) SET \
                 destination_id = $id, \
                 donation_recipient = $donation_recipient, \
                 donation_amount = $donation_amount, \
                 paypal_url = $paypal_url, \
                 donation_text = $donation_text, \
                 facebook_url = $facebook_url, \
                 instagram_url = $instagram_url, \
                 comm_langs = $comm_langs, \
                 spoken_langs = $spoken_langs, \
                 default_lang = $default_lang, \
                 auto_handling = $auto_handling, \
                 request_wall_open = $request_wall_open, \
                 ask_visitor_comment = $ask_visitor_comment, \
                 visitor_comment_prompt = $visitor_comment_prompt, \
                 closure_active = $closure_active, \
                 closure_start = $closure_start, \
                 closure_end = $closure_end, \
                 closure_text = $closure_text, \
                 closure_max_participants = $closure_max_participants, \
                 signature_name = $signature_name, \
                 signature_url = $signature_url, \
                 signature_social_label_1 = $signature_social_label_1, \
                 signature_social_url_1 = $signature_social_url_1, \
                 signature_social_label_2 = $signature_social_label_2, \
                 signature_social_url_2 = $signature_social_url_2, \
                 signature_tagline = $signature_tagline, \
                 footer_title = $footer_title, \
                 footer_text = $footer_text, \
                 footer_start = $footer_start, \
                 footer_end = $footer_end",
            )
            .bind(("id", id_str.clone()))
            .bind(("donation_recipient", data.donation_recipient.clone()))
            .bind(("donation_amount", data.donation_amount))
            .bind(("paypal_url", data.paypal_url.clone()))
            .bind(("donation_text", data.donation_text.clone()))
            .bind(("facebook_url", data.facebook_url.clone()))
            .bind(("instagram_url", data.instagram_url.clone()))
            .bind(("comm_langs", data.comm_langs.clone()))
            .bind(("spoken_langs", data.spoken_langs.clone()))
            .bind(("default_lang", data.default_lang.clone()))
            .bind(("auto_handling", data.auto_handling))
            .bind(("request_wall_open", data.request_wall_open))
            .bind(("ask_visitor_comment", data.ask_visitor_comment))
            .bind(("visitor_comment_prompt", data.visitor_comment_prompt.clone()))
            .bind(("closure_active", data.closure_active))
            .bind(("closure_start", date_to_string(data.closure_start)))
            .bind(("closure_end", date_to_string(data.closure_end)))
            .bind(("closure_text", data.closure_text.clone()))
            .bind(("closure_max_participants", data.closure_max_participants))
            .bind(("signature_name", data.signature_name.clone()))
            .bind(("signature_url", data.signature_url.clone()))
            .bind(("signature_social_label_1", data.signature_social_label_1.clone()))
            .bind(("signature_social_url_1", data.signature_social_url_1.clone()))
            .bind(("signature_social_label_2", data.signature_social_label_2.clone()))
            .bind(("signature_social_url_2", data.signature_social_url_2.clone()))
            .bind(("signature_tagline", data.signature_tagline.clone()))
            .bind(("footer_title", data.footer_title.clone()))
            .bind(("footer_text", data.footer_text.clone()))
            .bind(("footer_start", date_to_string(data.footer_start)))
            .bind(("footer_end", date_to_string(data.footer_end)))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("destination_data", e))?;

        Ok(data)
    }

    async fn get_flux(&self, destination_id: Uuid) -> GreetnetResult<Option<DestinationFlux>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('destination_flux', $id)")
            .bind(("id", destination_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DestinationFluxRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(DestinationFluxRow::try_into_flux)
            .transpose()?)
    }

    async fn upsert_flux(&self, flux: DestinationFlux) -> GreetnetResult<DestinationFlux> {
        let id_str = flux.destination_id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('destination_flux', $id) SET \
                 destination_id = $id, \
                 early_mail_frequency = $early_mail_frequency, \
                 early_confirmation_days = $early_confirmation_days, \
                 treatment_days = $treatment_days, \
                 urgency_days = $urgency_days, \
                 min_organisation_days = $min_organisation_days, \
                 greeter_reply_deadline = $greeter_reply_deadline, \
                 greeter_reminder_frequency = $greeter_reminder_frequency, \
                 visitor_reply_deadline = $visitor_reply_deadline, \
                 visitor_reminder_frequency = $visitor_reminder_frequency, \
                 pre_walk_reminder_days = $pre_walk_reminder_days, \
                 manual_entry_days = $manual_entry_days, \
                 report_deadline = $report_deadline, \
                 report_reminder_frequency = $report_reminder_frequency, \
                 review_request_days = $review_request_days, \
                 review_reminder_frequency = $review_reminder_frequency, \
                 review_deadline = $review_deadline, \
                 retention_days = $retention_days",
            )
            .bind(("id", id_str))
            .bind(("early_mail_frequency", flux.early_mail_frequency))
            .bind(("early_confirmation_days", flux.early_confirmation_days))
            .bind(("treatment_days", flux.treatment_days))
            .bind(("urgency_days", flux.urgency_days))
            .bind(("min_organisation_days", flux.min_organisation_days))
            .bind(("greeter_reply_deadline", flux.greeter_reply_deadline))
            .bind(("greeter_reminder_frequency", flux.greeter_reminder_frequency))
            .bind(("visitor_reply_deadline", flux.visitor_reply_deadline))
            .bind(("visitor_reminder_frequency", flux.visitor_reminder_frequency))
            .bind(("pre_walk_reminder_days", flux.pre_walk_reminder_days))
            .bind(("manual_entry_days", flux.manual_entry_days))
            .bind(("report_deadline", flux.report_deadline))
            .bind(("report_reminder_frequency", flux.report_reminder_frequency))
            .bind(("review_request_days", flux.review_request_days))
            .bind(("review_reminder_frequency", flux.review_reminder_frequency))
            .bind(("review_deadline", flux.review_deadline))
            .bind(("retention_days", flux.retention_days))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("destination_flux", e))?;

        Ok(flux)
    }
}
