//! Order invoices as single-file PDF 1.4 documents.
//!
//! Only the two standard Helvetica faces are used, so nothing is embedded: text is
//! encoded as WinAnsi and positioned absolutely on A4 pages.

use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};

use crate::emails::format_price;

const PAGE_WIDTH: i32 = 595;
const PAGE_HEIGHT: i32 = 842;
const MARGIN_LEFT: i32 = 50;
const MARGIN_RIGHT: i32 = PAGE_WIDTH - 50;
const TOP: i32 = PAGE_HEIGHT - 50;
/// Item rows stop here; the rest continues on a new page.
const ITEMS_BOTTOM: i32 = 150;
/// Totals and footer need this much room below the last row.
const TOTALS_MIN_Y: i32 = 240;
const DESCRIPTION_CHARS: usize = 45;

const DARK: &str = "0.1 0.1 0.1";
const GRAY: &str = "0.4 0.4 0.4";
const LIGHT: &str = "0.95 0.95 0.95";

pub struct Seller<'a> {
    pub name: &'a str,
    pub street: &'a str,
    pub city: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
}

pub const SHOP_NAME: &str = "Visionnaires Opticiens";
pub const SHOP_STREET: &str = "44 Cours Franklin Roosevelt";
pub const SHOP_CITY: &str = "69006 Lyon";
pub const SHOP_PHONE: &str = "+33 4 78 52 62 22";

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: i32,
    /// Frame plus lens options, in cents.
    pub unit_price: i64,
}

impl InvoiceLine {
    pub fn total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceData {
    pub order_number: String,
    pub issued_on: NaiveDate,
    pub customer_name: String,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub total: i64,
}

/// Split a VAT-inclusive amount at 20 %: `(net, vat)`, net rounded to the cent.
pub fn vat_split(gross: i64) -> (i64, i64) {
    let net = (gross * 10 + 6).div_euclid(12);
    (net, gross - net)
}

pub fn french_date(date: NaiveDate) -> String {
    const MONTHS: [&str; 12] = [
        "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
        "octobre", "novembre", "décembre",
    ];
    format!(
        "{} {} {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

pub fn filename(order_number: &str) -> String {
    format!("facture-{order_number}.pdf")
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Content stream of one page.
#[derive(Default)]
struct Canvas {
    ops: Vec<u8>,
}

impl Canvas {
    fn text(&mut self, x: i32, y: i32, size: u8, font: Font, color: &str, text: &str) {
        let mut op = String::new();
        let _ = write!(
            op,
            "BT /{} {size} Tf {color} rg {x} {y} Td (",
            font.resource()
        );
        self.ops.extend_from_slice(op.as_bytes());
        self.ops.extend_from_slice(&encode_text(text));
        self.ops.extend_from_slice(b") Tj ET\n");
    }

    fn rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: &str) {
        let op = format!("{color} rg {x} {y} {width} {height} re f\n");
        self.ops.extend_from_slice(op.as_bytes());
    }

    fn hline(&mut self, x1: i32, x2: i32, y: i32, color: &str) {
        let op = format!("{color} RG 0.5 w {x1} {y} m {x2} {y} l S\n");
        self.ops.extend_from_slice(op.as_bytes());
    }
}

/// Encode text for a PDF literal string in WinAnsi. Bytes outside ASCII are written as
/// octal escapes; characters WinAnsi lacks become `?`.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let byte = match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                ch as u8
            }
            ' '..='~' => ch as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            'Œ' => 0x8C,
            'œ' => 0x9C,
            '\u{202f}' => b' ',
            c if ('\u{a0}'..='\u{ff}').contains(&c) => c as u32 as u8,
            _ => b'?',
        };
        if byte.is_ascii() {
            out.push(byte);
        } else {
            out.extend_from_slice(format!("\\{byte:03o}").as_bytes());
        }
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn table_header(canvas: &mut Canvas, y: i32) {
    canvas.rect(MARGIN_LEFT, y - 5, MARGIN_RIGHT - MARGIN_LEFT, 25, LIGHT);
    canvas.text(MARGIN_LEFT + 10, y + 5, 10, Font::Bold, DARK, "Description");
    canvas.text(380, y + 5, 10, Font::Bold, DARK, "Qté");
    canvas.text(420, y + 5, 10, Font::Bold, DARK, "Prix unit.");
    canvas.text(490, y + 5, 10, Font::Bold, DARK, "Total");
}

fn lay_out(data: &InvoiceData, seller: &Seller<'_>) -> Vec<Canvas> {
    let mut pages = Vec::new();
    let mut page = Canvas::default();

    let mut y = TOP;
    page.text(MARGIN_LEFT, y, 18, Font::Bold, DARK, &seller.name.to_uppercase());
    page.text(MARGIN_RIGHT - 100, y, 14, Font::Bold, DARK, "FACTURE");
    y -= 20;
    page.text(MARGIN_RIGHT - 100, y, 10, Font::Regular, GRAY, &data.order_number);

    y -= 40;
    page.text(MARGIN_LEFT, y, 10, Font::Bold, DARK, "De :");
    y -= 15;
    page.text(MARGIN_LEFT, y, 10, Font::Regular, DARK, seller.name);
    for line in [
        seller.street.to_string(),
        seller.city.to_string(),
        format!("Tél : {}", seller.phone),
        format!("Email : {}", seller.email),
    ] {
        y -= 12;
        page.text(MARGIN_LEFT, y, 10, Font::Regular, GRAY, &line);
    }

    let client_x = 320;
    let mut client_y = PAGE_HEIGHT - 130;
    page.text(client_x, client_y, 10, Font::Bold, DARK, "Facturé à :");
    client_y -= 15;
    page.text(client_x, client_y, 10, Font::Regular, DARK, &data.customer_name);
    let postal_city = match (&data.postal_code, &data.city) {
        (Some(code), Some(city)) => Some(format!("{code} {city}")),
        _ => None,
    };
    for line in [data.street.clone(), postal_city, data.email.clone()]
        .into_iter()
        .flatten()
    {
        client_y -= 12;
        page.text(client_x, client_y, 10, Font::Regular, GRAY, &line);
    }

    y -= 40;
    let issued = format!("Date de facture : {}", french_date(data.issued_on));
    page.text(MARGIN_LEFT, y, 10, Font::Regular, GRAY, &issued);

    y -= 40;
    table_header(&mut page, y);
    y -= 30;

    for line in &data.lines {
        if y < ITEMS_BOTTOM {
            pages.push(std::mem::take(&mut page));
            y = TOP;
            table_header(&mut page, y);
            y -= 30;
        }
        page.text(
            MARGIN_LEFT + 10,
            y,
            9,
            Font::Regular,
            DARK,
            &truncate(&line.description, DESCRIPTION_CHARS),
        );
        page.text(380, y, 9, Font::Regular, DARK, &line.quantity.to_string());
        page.text(420, y, 9, Font::Regular, DARK, &format_price(line.unit_price));
        page.text(490, y, 9, Font::Regular, DARK, &format_price(line.total()));
        y -= 20;
    }

    if y < TOTALS_MIN_Y {
        pages.push(std::mem::take(&mut page));
        y = TOP;
    }
    y -= 10;
    page.hline(MARGIN_LEFT, MARGIN_RIGHT, y, GRAY);

    let label_x = 380;
    let value_x = 490;
    let (net, vat) = vat_split(data.subtotal);
    let mut totals = vec![
        ("Sous-total HT :", net),
        ("TVA (20%) :", vat),
    ];
    if data.shipping_cost > 0 {
        totals.push(("Frais de port :", data.shipping_cost));
    }
    y -= 7;
    for (label, amount) in totals {
        y -= 18;
        page.text(label_x, y, 10, Font::Regular, GRAY, label);
        page.text(value_x, y, 10, Font::Regular, DARK, &format_price(amount));
    }

    y -= 25;
    page.rect(label_x - 10, y - 5, MARGIN_RIGHT - label_x + 10, 25, LIGHT);
    page.text(label_x, y + 5, 11, Font::Bold, DARK, "TOTAL TTC :");
    page.text(value_x, y + 5, 11, Font::Bold, DARK, &format_price(data.total));

    page.text(MARGIN_LEFT, 70, 10, Font::Regular, GRAY, "Merci pour votre confiance.");
    page.text(
        MARGIN_LEFT,
        55,
        9,
        Font::Regular,
        GRAY,
        "Paiement effectué par carte bancaire via Alma.",
    );

    pages.push(page);
    pages
}

/// Serialise objects in order, tracking byte offsets for the cross-reference table.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Objects must be written in id order starting at 1.
    fn object(&mut self, body: &[u8]) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, content: &[u8]) {
        let mut body = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(b"\nendstream");
        self.object(&body);
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_at = self.buf.len();
        let size = self.offsets.len() + 1;
        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            let _ = writeln!(xref, "{offset:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {size} /Root {root} 0 R /Info {info} 0 R >>\nstartxref\n{xref_at}\n%%EOF\n"
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

/// Render the invoice. Object layout: 1 catalog, 2 page tree, 3-4 fonts, 5 info,
/// then a page object and its content stream per page.
pub fn render(data: &InvoiceData, seller: &Seller<'_>) -> Vec<u8> {
    let pages = lay_out(data, seller);
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 6 + 2 * i).collect();

    let mut pdf = PdfWriter::new();
    pdf.object(b"<< /Type /Catalog /Pages 2 0 R >>");
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    pdf.object(format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()).as_bytes());
    pdf.object(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>");
    pdf.object(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );
    let mut info = b"<< /Title (".to_vec();
    info.extend_from_slice(&encode_text(&format!("Facture {}", data.order_number)));
    info.extend_from_slice(b") /Author (");
    info.extend_from_slice(&encode_text(seller.name));
    info.extend_from_slice(b") >>");
    pdf.object(&info);

    for (page, id) in pages.iter().zip(&page_ids) {
        pdf.object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                id + 1
            )
            .as_bytes(),
        );
        pdf.stream(&page.ops);
    }

    pdf.finish(1, 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seller() -> Seller<'static> {
        Seller {
            name: SHOP_NAME,
            street: SHOP_STREET,
            city: SHOP_CITY,
            phone: SHOP_PHONE,
            email: "contact@shop.test",
        }
    }

    fn invoice(lines: usize) -> InvoiceData {
        InvoiceData {
            order_number: "VO-2026-0042".to_string(),
            issued_on: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            customer_name: "Claire Martin".to_string(),
            street: Some("12 rue de la Paix".to_string()),
            postal_code: Some("75002".to_string()),
            city: Some("Paris".to_string()),
            email: Some("claire@example.fr".to_string()),
            lines: (0..lines)
                .map(|i| InvoiceLine {
                    description: format!("Monture Lyon (Écaille) n°{i}"),
                    quantity: 1,
                    unit_price: 8_000,
                })
                .collect(),
            subtotal: 8_000 * lines as i64,
            shipping_cost: 690,
            total: 8_000 * lines as i64 + 690,
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn vat_is_a_sixth_of_the_gross_amount() {
        assert_eq!(vat_split(12_000), (10_000, 2_000));
        assert_eq!(vat_split(8_000), (6_667, 1_333));
        assert_eq!(vat_split(0), (0, 0));
    }

    #[test]
    fn dates_are_written_in_french() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        assert_eq!(french_date(date), "3 août 2026");
    }

    #[test]
    fn text_is_escaped_and_winansi_encoded() {
        assert_eq!(encode_text("a(b)\\"), b"a\\(b\\)\\\\".to_vec());
        assert_eq!(encode_text("86,90 €"), b"86,90 \\200".to_vec());
        assert_eq!(encode_text("é"), b"\\351".to_vec());
        assert_eq!(encode_text("→"), b"?".to_vec());
    }

    #[test]
    fn document_is_well_formed() {
        let pdf = render(&invoice(2), &seller());
        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(find(&pdf, b"(VO-2026-0042) Tj").is_some());
        assert!(find(&pdf, b"(TOTAL TTC :) Tj").is_some());
        assert!(find(&pdf, b"/Count 1").is_some());

        // Every xref entry points at the start of its object.
        let text = String::from_utf8_lossy(&pdf).into_owned();
        let xref_at: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        let xref = String::from_utf8_lossy(&pdf[xref_at..]).into_owned();
        assert!(xref.starts_with("xref\n0 8\n"));
        let entries = xref.lines().skip(3).take(7);
        for (i, entry) in entries.enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{} 0 obj", i + 1);
            assert!(pdf[offset..].starts_with(expected.as_bytes()), "object {}", i + 1);
        }
    }

    #[test]
    fn long_orders_continue_on_new_pages() {
        let pdf = render(&invoice(40), &seller());
        assert!(find(&pdf, b"/Count 2").is_some());
        assert!(find(&pdf, b"/Kids [6 0 R 8 0 R]").is_some());
    }
}
