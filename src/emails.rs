//! HTML email templates.
//!
//! Every template shares one layout. Values coming from customers are escaped before
//! being interpolated.

use chrono::{Datelike, Utc};

use crate::{
    dto::contact::AppointmentRequest,
    models::{DeliveryMethod, OrderItem},
};

const SHOP_ADDRESS: &str = "44 Cours Franklin Roosevelt, 69006 Lyon";
const SHOP_PHONE: &str = "04 78 52 62 22";
const SHOP_PHONE_LINK: &str = "tel:+33478526222";
const BRAND: &str = "Visionnaire Opticiens";

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

pub struct OrderConfirmation<'a> {
    pub order_number: &'a str,
    pub first_name: &'a str,
    pub items: &'a [OrderItem],
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub total: i64,
    pub delivery_method: DeliveryMethod,
    pub street: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub city: Option<&'a str>,
}

/// Renders templates with links pointing at the storefront.
#[derive(Debug, Clone, Copy)]
pub struct Templates<'a> {
    site_url: &'a str,
}

impl<'a> Templates<'a> {
    pub fn new(site_url: &'a str) -> Self {
        Self { site_url }
    }

    pub fn order_confirmation(&self, data: &OrderConfirmation<'_>) -> Email {
        let rows: String = data
            .items
            .iter()
            .map(|item| {
                let variant = item
                    .variant_info
                    .as_deref()
                    .map(|v| format!("<br/><span style=\"color:#a8a29e;font-size:12px;\">{}</span>", escape(v)))
                    .unwrap_or_default();
                let lens = item
                    .lens_options_summary
                    .as_deref()
                    .map(|v| format!("<br/><span style=\"color:#a8a29e;font-size:12px;\">Verres : {}</span>", escape(v)))
                    .unwrap_or_default();
                format!(
                    "<tr><td style=\"padding:12px 0;font-size:13px;color:#44403c;\"><strong>{}</strong>{}{}</td>\
                     <td style=\"padding:12px 0;font-size:13px;text-align:center;\">×{}</td>\
                     <td style=\"padding:12px 0;font-size:13px;text-align:right;\">{}</td></tr>",
                    escape(&item.product_name),
                    variant,
                    lens,
                    item.quantity,
                    format_price(item.line_total())
                )
            })
            .collect();

        let shipping = if data.shipping_cost > 0 {
            format_price(data.shipping_cost)
        } else {
            "Offerte".to_string()
        };

        let address = match data.delivery_method {
            DeliveryMethod::Domicile => match (data.street, data.postal_code, data.city) {
                (Some(street), postal_code, city) => paragraph(&format!(
                    "{}<br/>{} {}",
                    escape(street),
                    escape(postal_code.unwrap_or_default()),
                    escape(city.unwrap_or_default())
                )),
                _ => String::new(),
            },
            DeliveryMethod::Boutique => paragraph(SHOP_ADDRESS),
        };

        let content = format!(
            "{}{}{}<table role=\"presentation\" width=\"100%\">{}</table>\
             <table role=\"presentation\" width=\"100%\" style=\"margin-top:16px;\">\
             <tr><td>Sous-total</td><td style=\"text-align:right;\">{}</td></tr>\
             <tr><td>Livraison</td><td style=\"text-align:right;\">{}</td></tr>\
             <tr><td><strong>Total</strong></td><td style=\"text-align:right;\"><strong>{}</strong></td></tr>\
             </table>{}{}{}{}{}",
            heading("Merci pour votre commande !"),
            subheading(&format!(
                "Bonjour {}, votre commande {} a bien été enregistrée.",
                escape(data.first_name),
                escape(data.order_number)
            )),
            divider(),
            rows,
            format_price(data.subtotal),
            shipping,
            format_price(data.total),
            divider(),
            caption("Mode de livraison"),
            paragraph(data.delivery_method.label()),
            address,
            self.button("Suivre ma commande", "/compte"),
        );

        Email {
            subject: format!("Commande {} confirmée — {BRAND}", data.order_number),
            html: self.layout(&content),
        }
    }

    pub fn order_shipped(
        &self,
        order_number: &str,
        first_name: &str,
        tracking_number: Option<&str>,
    ) -> Email {
        let tracking = tracking_number
            .filter(|t| !t.is_empty())
            .map(|t| {
                format!(
                    "{}{}<p style=\"font-family:monospace;font-size:16px;\">{}</p>",
                    divider(),
                    caption("Numéro de suivi"),
                    escape(t)
                )
            })
            .unwrap_or_default();

        let content = format!(
            "{}{}{}{}{}",
            heading("Votre commande est en route !"),
            subheading(&format!(
                "Bonjour {}, votre commande {} a été expédiée.",
                escape(first_name),
                escape(order_number)
            )),
            paragraph("Vous la recevrez sous 2 à 4 jours ouvrés à l'adresse indiquée lors de votre commande."),
            tracking,
            self.button("Suivre ma commande", "/compte"),
        );

        Email {
            subject: format!("Commande {order_number} expédiée — {BRAND}"),
            html: self.layout(&content),
        }
    }

    pub fn order_ready(&self, order_number: &str, first_name: &str) -> Email {
        let content = format!(
            "{}{}{}{}{}{}{}",
            heading("Votre commande est prête !"),
            subheading(&format!(
                "Bonjour {}, votre commande {} vous attend en boutique.",
                escape(first_name),
                escape(order_number)
            )),
            paragraph("Rendez-vous dans notre boutique avec une pièce d'identité pour récupérer votre commande."),
            divider(),
            caption("Adresse de la boutique"),
            paragraph(&format!("{SHOP_ADDRESS}<br/>Lun : 14h–19h · Mar–Sam : 10h–19h")),
            self.button("Mon compte", "/compte"),
        );

        Email {
            subject: format!("Commande {order_number} prête en boutique — {BRAND}"),
            html: self.layout(&content),
        }
    }

    pub fn appointment_confirmation(&self, request: &AppointmentRequest) -> Email {
        let content = format!(
            "{}{}{}{}",
            heading("Demande de rendez-vous reçue"),
            subheading(&format!(
                "Bonjour {}, nous avons bien reçu votre demande ({}).",
                escape(&request.first_name),
                escape(reason_label(&request.reason))
            )),
            request
                .preferred_date
                .as_deref()
                .map(|d| paragraph(&format!("Date souhaitée : {}", escape(d))))
                .unwrap_or_default(),
            paragraph("Notre équipe vous recontacte rapidement pour confirmer le créneau."),
        );

        Email {
            subject: format!("Votre demande de rendez-vous — {BRAND}"),
            html: self.layout(&content),
        }
    }

    pub fn appointment_notification(&self, request: &AppointmentRequest) -> Email {
        let row = |label: &str, value: &str| {
            format!(
                "<tr><td style=\"padding:4px 0;font-size:13px;color:#a8a29e;\">{label}</td>\
                 <td style=\"padding:4px 0;font-size:14px;\">{}</td></tr>",
                escape(value)
            )
        };
        let rows = [
            row("Nom", &format!("{} {}", request.first_name, request.last_name)),
            row("Email", &request.email),
            row("Téléphone", &request.phone),
            row("Motif", reason_label(&request.reason)),
            row("Date souhaitée", request.preferred_date.as_deref().unwrap_or("—")),
            row("Message", request.message.as_deref().unwrap_or("—")),
        ]
        .concat();

        let content = format!(
            "{}<table role=\"presentation\" width=\"100%\">{}</table>",
            heading("Nouvelle demande de rendez-vous"),
            rows
        );

        Email {
            subject: format!(
                "Nouveau RDV — {} {} ({})",
                request.first_name,
                request.last_name,
                reason_label(&request.reason)
            ),
            html: self.layout(&content),
        }
    }

    pub fn newsletter_welcome(&self) -> Email {
        let content = format!(
            "{}{}{}{}",
            heading("Bienvenue dans l'univers Visionnaire"),
            subheading("Merci de vous être inscrit à notre newsletter."),
            paragraph("Vous recevrez en avant-première nos nouvelles collections et nos offres exclusives."),
            self.button("Découvrir le catalogue", "/catalogue"),
        );

        Email {
            subject: format!("Bienvenue chez {BRAND}"),
            html: self.layout(&content),
        }
    }

    fn button(&self, text: &str, path: &str) -> String {
        format!(
            "<p style=\"margin:32px 0;\"><a href=\"{}{}\" style=\"background:#1c1917;color:#fff;\
             padding:14px 32px;text-decoration:none;font-size:12px;letter-spacing:2px;\
             text-transform:uppercase;\">{}</a></p>",
            self.site_url, path, text
        )
    }

    fn layout(&self, content: &str) -> String {
        format!(
            "<!DOCTYPE html><html lang=\"fr\"><head><meta charset=\"UTF-8\" />\
             <title>{BRAND}</title></head>\
             <body style=\"margin:0;padding:0;background-color:#fafaf9;font-family:-apple-system,sans-serif;\">\
             <table role=\"presentation\" width=\"100%\"><tr><td align=\"center\" style=\"padding:40px 16px;\">\
             <table role=\"presentation\" width=\"600\" style=\"max-width:600px;width:100%;\">\
             <tr><td align=\"center\" style=\"padding-bottom:32px;\"><a href=\"{site}\">\
             <img src=\"{site}/logos/logo-black.png\" alt=\"{BRAND}\" width=\"180\" /></a></td></tr>\
             <tr><td style=\"background-color:#ffffff;border:1px solid #e7e5e4;padding:40px 32px;\">{content}</td></tr>\
             <tr><td style=\"padding:24px 0;text-align:center;font-size:11px;color:#a8a29e;\">\
             {BRAND} — {SHOP_ADDRESS}<br/><a href=\"{SHOP_PHONE_LINK}\">{SHOP_PHONE}</a>\
             <p>© {year} {BRAND}. Tous droits réservés.</p></td></tr>\
             </table></td></tr></table></body></html>",
            site = self.site_url,
            year = Utc::now().year(),
        )
    }
}

/// Formats cents as a French euro amount, e.g. `1 234,50 €`.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let euros = (cents / 100).to_string();
    let mut grouped = String::with_capacity(euros.len() + euros.len() / 3);
    for (i, ch) in euros.chars().enumerate() {
        if i > 0 && (euros.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped},{:02} €", cents % 100)
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn reason_label(reason: &str) -> &str {
    match reason {
        "examen_vue" => "Examen de vue",
        "essayage" => "Essayage",
        "ajustement" => "Ajustement",
        "conseil" => "Conseil",
        other => other,
    }
}

fn heading(text: &str) -> String {
    format!("<h1 style=\"margin:0 0 8px;font-size:24px;font-weight:300;color:#1c1917;\">{text}</h1>")
}

fn subheading(text: &str) -> String {
    format!("<p style=\"margin:0 0 24px;font-size:14px;color:#78716c;\">{text}</p>")
}

fn paragraph(text: &str) -> String {
    format!("<p style=\"margin:0 0 16px;font-size:14px;color:#44403c;line-height:1.7;\">{text}</p>")
}

fn caption(text: &str) -> String {
    format!("<p style=\"margin:0;font-size:12px;color:#a8a29e;text-transform:uppercase;letter-spacing:1px;\">{text}</p>")
}

fn divider() -> String {
    "<hr style=\"border:none;border-top:1px solid #e7e5e4;margin:24px 0;\" />".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn prices_use_french_formatting() {
        assert_eq!(format_price(16_000), "160,00 €");
        assert_eq!(format_price(690), "6,90 €");
        assert_eq!(format_price(123_456), "1 234,56 €");
        assert_eq!(format_price(0), "0,00 €");
    }

    #[test]
    fn customer_values_are_escaped() {
        let templates = Templates::new("https://shop.test");
        let email = templates.order_ready("VO-2026-0001", "<script>");
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
        assert_eq!(email.subject, "Commande VO-2026-0001 prête en boutique — Visionnaire Opticiens");
    }

    #[test]
    fn shipped_email_includes_tracking_number_when_present() {
        let templates = Templates::new("https://shop.test");
        let with = templates.order_shipped("VO-2026-0002", "Claire", Some("6A123456789"));
        let without = templates.order_shipped("VO-2026-0002", "Claire", None);
        assert!(with.html.contains("6A123456789"));
        assert!(!without.html.contains("Numéro de suivi"));
    }

    #[test]
    fn confirmation_lists_lines_and_free_shipping() {
        let templates = Templates::new("https://shop.test");
        let items = vec![OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            product_name: "Monture Lyon".into(),
            variant_info: Some("Noir - 52".into()),
            quantity: 2,
            unit_price: 8_000,
            lens_type: None,
            lens_options_summary: None,
            lens_options_price: 0,
        }];
        let email = templates.order_confirmation(&OrderConfirmation {
            order_number: "VO-2026-0003",
            first_name: "Claire",
            items: &items,
            subtotal: 16_000,
            shipping_cost: 0,
            total: 16_000,
            delivery_method: DeliveryMethod::Boutique,
            street: None,
            postal_code: None,
            city: None,
        });
        assert!(email.html.contains("Monture Lyon"));
        assert!(email.html.contains("160,00 €"));
        assert!(email.html.contains("Offerte"));
        assert!(email.html.contains(SHOP_ADDRESS));
    }
}
