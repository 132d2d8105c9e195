//! Film inspection form exports.
//!
//! Each product variant has its own template and layout. The registry below
//! drives both the export routes and variant validation on save.

mod pg;
mod uc;

use tracing::info;

use crate::db::{self, DbPool};
use crate::services::formatting::sanitize_filename;
use crate::services::mapping::{self, field_text, Record, SheetLayout};
use crate::services::workbook::{Templates, Workbook, XlsxDownload};
use crate::{Error, Result};

const PAGE1_EQUIPMENT: &[&str] = &["equipment_used", "page1"];
const PAGE2_EQUIPMENT: &[&str] = &["equipment_used", "page2"];
const PAGE3_EQUIPMENT: &[&str] = &["equipment_used", "page3"];
const PAGE4_EQUIPMENT: &[&str] = &["equipment_used", "page4"];
const PAGE5_EQUIPMENT: &[&str] = &["equipment_used", "page5"];

/// A film inspection product variant.
#[derive(Debug)]
pub struct Variant {
    /// Route and database slug, e.g. `uc-18gsm-250p-abqr`.
    pub slug: &'static str,
    pub template: &'static str,
    /// Product code used in the filename when the form has none.
    pub default_code: &'static str,
    pub layouts: &'static [SheetLayout],
}

pub static VARIANTS: &[Variant] = &[
    Variant {
        slug: "uc-18gsm-250p-abqr",
        template: "UC-18gsm-250P-ABQR.xlsx",
        default_code: "UC-18gsm-250P-ABQR",
        layouts: uc::UC_18GSM_ABQR,
    },
    Variant {
        slug: "uc-18gsm-290p-abqr",
        template: "UC-18gsm-290P-ABQR.xlsx",
        default_code: "UC-18gsm-290P-ABQR",
        layouts: uc::UC_18GSM_ABQR,
    },
    Variant {
        slug: "uc-18gsm-290np-abqr",
        template: "UC-18gsm-290NP-ABQR.xlsx",
        default_code: "UC-18gsm-290NP-ABQR",
        layouts: uc::UC_18GSM_ABQR,
    },
    Variant {
        slug: "uc-18gsm-250w-bfqr",
        template: "UC-18gsm-250W-BFQR.xlsx",
        default_code: "UC-18gsm-250W-BFQR",
        layouts: uc::UC_18GSM_250W_BFQR,
    },
    Variant {
        slug: "uc-18gsm-210w-bfqr",
        template: "UC-18gsm-210W-BFQR.xlsx",
        default_code: "UC-18gsm-210W-BFQR",
        layouts: uc::UC_18GSM_210W_BFQR,
    },
    Variant {
        slug: "uc-16gsm-165w",
        template: "UC-16gsm-165W.xlsx",
        default_code: "UC-16gsm-165W",
        layouts: uc::UC_16GSM_165W,
    },
    Variant {
        slug: "168-16cp-kranti",
        template: "168-16cp-kranti.xlsx",
        default_code: "UNKNOWN",
        layouts: pg::KRANTI_168_16CP,
    },
    Variant {
        slug: "176-18cp-ww",
        template: "176-18cp-ww.xlsx",
        default_code: "UNKNOWN",
        layouts: pg::WW_176_18CP,
    },
    Variant {
        slug: "168-16c-white",
        template: "168-16c-white.xlsx",
        default_code: "UNKNOWN",
        layouts: pg::WHITE_168_16C,
    },
    Variant {
        slug: "168-18c-white",
        template: "168-18c-white.xlsx",
        default_code: "UNKNOWN",
        layouts: pg::WHITE_168_18C,
    },
    Variant {
        slug: "168-18c-white-jeddah",
        template: "168-18c-white-jeddah.xlsx",
        default_code: "UNKNOWN",
        layouts: pg::WHITE_168_18C_JEDDAH,
    },
    Variant {
        slug: "102-18c-white",
        template: "102-18c-white.xlsx",
        default_code: "UNKNOWN",
        layouts: pg::WHITE_102_18C,
    },
    Variant {
        slug: "234-18-micro-white",
        template: "234-18-micro-white.xlsx",
        default_code: "UNKNOWN",
        layouts: pg::MICRO_234_18,
    },
    Variant {
        slug: "214-18-micro-white",
        template: "214-18-micro-white.xlsx",
        default_code: "UNKNOWN",
        layouts: pg::MICRO_214_18,
    },
];

/// Look up a variant by slug.
pub fn find_variant(slug: &str) -> Option<&'static Variant> {
    VARIANTS.iter().find(|v| v.slug == slug)
}

impl Variant {
    /// Export route for this variant.
    pub fn route(&self) -> String {
        format!("/export-{}-form", self.slug)
    }

    /// Download filename, `FIF-{product_code}-.xlsx`.
    pub fn filename(&self, record: &Record) -> String {
        let code = field_text(record, "product_code").unwrap_or_else(|| self.default_code.into());
        sanitize_filename(&format!("FIF-{}-.xlsx", code))
    }

    /// Write a form record into an opened template.
    pub fn render(&self, record: &Record, workbook: &mut Workbook) -> usize {
        mapping::apply(self.layouts, record, workbook)
    }
}

/// Load a stored form and export it with its variant's template.
pub async fn export_form(
    pool: &DbPool,
    templates: &Templates,
    variant: &Variant,
    form_id: &str,
) -> Result<XlsxDownload> {
    let form = db::get_film_form(pool, form_id).await?;
    if form.variant != variant.slug {
        return Err(Error::NotFound(format!(
            "Form {} is not a {} form",
            form_id, variant.slug
        )));
    }

    let record = form.to_record()?;
    let mut workbook = templates.open(variant.template)?;
    let written = variant.render(&record, &mut workbook);

    info!(
        form_id,
        variant = variant.slug,
        template = variant.template,
        cells = written,
        "Film inspection form exported"
    );

    workbook.finish(variant.filename(&record))
}
