//! Renders the low-stock list into the alert email body.
//!
//! The layout is fixed: header, one `<li>` per product (or a single
//! placeholder item), recommendation paragraphs, then the signature block.

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::alert_models::SenderIdentity;
use crate::core::stock::LowStockEntry;

/// Shown as the only list item when nothing is below the threshold.
pub const NO_LOW_STOCK_PLACEHOLDER: &str = "Nenhum produto com estoque baixo.";

const HEADER: &str = r#"<div style="font-family: Arial, sans-serif; color: #333;">
<h2 style="color: #000000;">Aviso Urgente: <span style="color: #000000;">Estoque Baixo</span></h2>
<hr style="border: 0; border-top: 1px solid #000000;">

<p style="font-size: 16px;">Prezado(a),</p>

<p style="font-size: 16px;">
<em>Espero que esteja bem.</em>
</p>

<p style="font-size: 16px;">
    Gostaria de alertá-lo sobre a situação atual do estoque.
    Identificamos que os seguintes produtos estão com níveis de estoque <strong style="color: #FF0000;">críticos</strong>:
</p>
"#;

const RECOMMENDATIONS: &str = r#"
<p style="font-size: 16px;">
    <strong>Recomendamos</strong> que uma verificação seja feita o quanto antes e que sejam tomadas as medidas necessárias para evitar a falta desses itens.
</p>

<p style="font-size: 16px;">
    Por favor, não hesite em me contatar caso precise de mais informações ou assistência.
</p>

<hr style="border: 0; border-top: 1px solid #000000;">
"#;

/// Produces the HTML body for a list of low-stock products.
pub fn compose_alert(entries: &[LowStockEntry], sender: &SenderIdentity) -> String {
    let mut html = String::from(HEADER);

    html.push_str("\n<ul style=\"font-size: 16px;\">\n");
    if entries.is_empty() {
        html.push_str(&format!("<li>{}</li>\n", NO_LOW_STOCK_PLACEHOLDER));
    } else {
        for entry in entries {
            html.push_str(&format!("<li><strong>{}</strong></li>\n", entry_line(entry)));
        }
    }
    html.push_str("</ul>\n");

    html.push_str(RECOMMENDATIONS);
    html.push_str(&signature_block(sender));
    html.push_str("</div>\n");

    html
}

/// `Produto: <name>, Estoque: <quantity>`, with the name escaped.
pub fn entry_line(entry: &LowStockEntry) -> String {
    format!(
        "Produto: {}, Estoque: {}",
        encode_text(&entry.name),
        entry.quantity
    )
}

fn signature_block(sender: &SenderIdentity) -> String {
    let mut lines = vec!["Atenciosamente,".to_string()];

    if !sender.name.is_empty() {
        lines.push(format!("<strong>{}</strong>", encode_text(&sender.name)));
    }
    if !sender.department.is_empty() {
        lines.push(encode_text(&sender.department).into_owned());
    }
    if !sender.organization.is_empty() {
        lines.push(format!(
            "<span style=\"color: #228B22;\">{}</span>",
            encode_text(&sender.organization)
        ));
    }
    if !sender.email.is_empty() {
        lines.push(format!(
            "<a href=\"mailto:{}\" style=\"color: #003366;\">{}</a>",
            encode_double_quoted_attribute(&sender.email),
            encode_text(&sender.email)
        ));
    }
    if !sender.phone.is_empty() {
        lines.push(format!("Telefone: {}", encode_text(&sender.phone)));
    }

    format!(
        "\n<p style=\"font-size: 16px;\">\n    {}\n</p>\n",
        lines.join("<br>\n    ")
    )
}
