//! Client-student contract rendering.
//!
//! The contract is a fixed two-page letter document. Only the job-specific lines
//! vary; the clauses are constant. The finished PDF is returned base64-encoded so it
//! can travel inside a JSON body.

pub mod canvas;
pub mod font_metrics;

use std::path::Path;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;

use crate::contract::canvas::{Canvas, JpegImage};
use crate::contract::font_metrics::{wrap_lines, FontFace};
use crate::errors::AppError;

pub use canvas::JpegImage as Logo;

const INCH: f32 = 72.0;
const BODY_SIZE: f32 = 13.0;
const BODY_LEADING: f32 = 15.0;
const DESCRIPTION_BOX_HEIGHT: f32 = 200.0;
const LOGO_MAX_WIDTH: f32 = 150.0;
const LOGO_MAX_HEIGHT: f32 = 120.0;

const TERMINOLOGY: &str = "This document uses the following terminology: the Student is defined as the party that will complete the job that has been listed, while the Client is the person that posts the job and pays the student.";

const PAYMENT_CLAUSE: &str = "1. Payment – The client must pay the agreed price, detailed above, upon satisfactory completion of the job by the student.";

const SCHEDULE_CLAUSE: &str = "2. Schedule – The student will complete the job in accordance with the agreed upon schedule.";

const ENTIRE_AGREEMENT_CLAUSE: &str = "3. Entire Agreement - This document reflects the entire agreement between the Parties and reflects a complete understanding of the Parties with respect to the subject matter. This Contract supersedes all prior written and oral representations. The Contract may not be amended, altered, or supplemented except in writing signed by both Parties.";

const BINDING_CLAUSE: &str = "4. Legal and Binding Contract - This Contract is legal and binding between the Parties as stated above. This Contract may be entered into and is legal and binding in Puerto Rico, the United States, and its other territories. The Parties each represent that they have the authority to enter into this Contract.";

const SEVERABILITY_CLAUSE: &str = "5. Severability - If any provision of this Contract shall be held to be invalid or unenforceable for any reason, the remaining provisions shall continue to be valid and enforceable. If the Court finds that any provision of this Contract is invalid or unenforceable, but that by limiting such provision it would become valid and enforceable, then such provision shall be deemed to be written, construed, and enforced as so limited.";

const APPLICABLE_LAW_CLAUSE: &str = "6. Applicable Law - This Contract shall be governed and construed in accordance with the laws of the state where the Property is located, without giving effect to any conflicts of law’s provisions.";

const TERMINATION_CLAUSE: &str = "7. Termination – Both parties can choose to terminate the contract; continued contract terminations without job completions will be faced with disciplinary action from the QWERTY Dev Solutions Admin team.";

const LIABILITY: &str = "PaRapido and the QWERTY Dev Solutions Team is not responsible for the general payment process between both Parties. In case of a breach of contract by either Party – namely, failure of payment by the client or failure of job execution by the student – and the dispute that arises cannot be resolved, then both Parties must resort to appropriate legal action.";

const CERTIFICATION: &str = "The page for the corresponding job contains a two-way certification process, allowing each Party to acknowledge and agree to the contract. BY CERTIFYING THIS STEP ON THE AFOREMENTIONED PAGE, BOTH PARTIES ACKNOWLEDGE HAVING READ AND UNDERSTOOD THIS CONTRACT AND THAT BOTH PARTIES ARE SATISFIED WITH THE TERMS AND CONDITIONS CONTAINED IN THIS CONTRACT. BOTH PARTIES ARE ENTITLED TO A COPY OF THIS CONTRACT.";

/// Job facts printed on the contract.
#[derive(Debug, Clone)]
pub struct ContractDetails {
    pub owner_name: String,
    pub owner_last: String,
    pub student_name: String,
    pub student_last: String,
    pub title: String,
    pub description: String,
    pub street: String,
    pub city: String,
    pub zipcode: String,
    /// Already formatted for display.
    pub price: String,
}

impl Logo {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read contract logo {}", path.display()))?;
        JpegImage::from_bytes(bytes)
            .with_context(|| format!("Contract logo {} is not a usable JPEG", path.display()))
    }

    /// Size in points after fitting into the logo box, keeping the aspect ratio.
    fn fitted_size(&self) -> (f32, f32) {
        let (w, h) = (self.width as f32, self.height as f32);
        let scale = (LOGO_MAX_WIDTH / w).min(LOGO_MAX_HEIGHT / h);
        (w * scale, h * scale)
    }
}

/// Renders the contract and returns the PDF as base64.
pub fn render_contract(
    details: &ContractDetails,
    logo: Option<&Logo>,
    today: NaiveDate,
) -> Result<String, AppError> {
    let pdf = render_pdf(details, logo, today).map_err(|e| AppError::Contract(format!("{e:#}")))?;
    Ok(STANDARD.encode(pdf))
}

fn render_pdf(details: &ContractDetails, logo: Option<&Logo>, today: NaiveDate) -> anyhow::Result<Vec<u8>> {
    let mut canvas = Canvas::letter();
    let width = canvas.width();
    let height = canvas.height();
    let text_width = width - 2.0 * INCH;

    let client = format!("{} {}", details.owner_name, details.owner_last);
    let student = format!("{} {}", details.student_name, details.student_last);
    let address = format!(
        "{}, {}, Puerto Rico, {}",
        details.street, details.city, details.zipcode
    );

    // Page 1
    canvas.set_font(FontFace::Helvetica, 10.0);
    canvas.draw_right_string(
        width - 0.5 * INCH,
        height - 0.25 * INCH,
        &format!("Contract Automatically Generated - {}", today.format("%Y-%m-%d")),
    );

    if let Some(logo) = logo {
        let (w, h) = logo.fitted_size();
        canvas.draw_image(logo, 230.0, 630.0, w, h);
    }

    canvas.set_font(FontFace::Helvetica, 12.0);
    canvas.draw_centred_string(width * 0.5, 600.0, "Client-Student Contract Agreement for: ");
    canvas.set_font(FontFace::HelveticaBoldOblique, 15.0);
    canvas.draw_centred_string(width * 0.5, 580.0, &details.title.to_uppercase());

    canvas.set_font(FontFace::Helvetica, BODY_SIZE);
    canvas.draw_string(INCH, 535.0, &format!("Client: {client}"));
    canvas.draw_string(INCH, 518.0, &format!("Student: {student}"));

    canvas.set_font(FontFace::HelveticaBold, 14.0);
    canvas.draw_string(width * 0.5 - 0.5 * INCH, 490.0, "Job Details");

    canvas.set_font(FontFace::Helvetica, BODY_SIZE);
    let mut description = wrap_lines(
        &format!("Description: {}", details.description),
        FontFace::Helvetica,
        BODY_SIZE,
        text_width,
    );
    description.truncate((DESCRIPTION_BOX_HEIGHT / BODY_LEADING) as usize);
    canvas.draw_lines(INCH, 300.0, BODY_LEADING, &description);
    canvas.draw_string(INCH, 270.0, &format!("Location: {address}"));
    canvas.draw_string(INCH, 250.0, &format!("Price: {}", details.price));

    for (text, y) in [(TERMINOLOGY, 185.0), (PAYMENT_CLAUSE, 135.0), (SCHEDULE_CLAUSE, 85.0)] {
        draw_paragraph(&mut canvas, text, y, text_width);
    }
    canvas.show_page()?;

    // Page 2
    canvas.set_font(FontFace::Helvetica, BODY_SIZE);
    for (text, y) in [
        (ENTIRE_AGREEMENT_CLAUSE, 665.0),
        (BINDING_CLAUSE, 580.0),
        (SEVERABILITY_CLAUSE, 465.0),
        (APPLICABLE_LAW_CLAUSE, 400.0),
        (TERMINATION_CLAUSE, 335.0),
        (LIABILITY, 240.0),
        (CERTIFICATION, 120.0),
    ] {
        draw_paragraph(&mut canvas, text, y, text_width);
    }

    canvas.set_font(FontFace::HelveticaBold, 16.0);
    canvas.draw_centred_string(width * 0.5, 80.0, "QWERTY Dev Solutions");
    canvas.set_font(FontFace::Helvetica, 12.0);
    canvas.draw_centred_string(width * 0.5, 60.0, "Email: parapidopr@gmail.com");
    canvas.show_page()?;

    canvas.finish()
}

fn draw_paragraph(canvas: &mut Canvas, text: &str, y_bottom: f32, text_width: f32) {
    let lines = wrap_lines(text, FontFace::Helvetica, BODY_SIZE, text_width);
    canvas.draw_lines(INCH, y_bottom, BODY_LEADING, &lines);
}
