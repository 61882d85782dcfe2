//! Built-in order-lifecycle templates installed at startup.

use chrono::Utc;

use super::types::Template;

struct Seed {
    name: &'static str,
    language: &'static str,
    body: &'static str,
    variables: &'static [&'static str],
}

const SEEDS: &[Seed] = &[
    Seed {
        name: "order_confirmation",
        language: "en",
        body: "Hi {{customer_name}}! Your order #{{order_id}} has been confirmed. \
               Total: {{total}}. We will keep you posted on its progress.",
        variables: &["customer_name", "order_id", "total"],
    },
    Seed {
        name: "order_confirmation",
        language: "es",
        body: "Hola {{customer_name}}! Tu pedido #{{order_id}} ha sido confirmado. \
               Total: {{total}}. Te mantendremos informado sobre su estado.",
        variables: &["customer_name", "order_id", "total"],
    },
    Seed {
        name: "order_shipped",
        language: "en",
        body: "Your order #{{order_id}} is on its way. Carrier: {{carrier}}, \
               tracking number: {{tracking_number}}.",
        variables: &["order_id", "carrier", "tracking_number"],
    },
    Seed {
        name: "order_shipped",
        language: "es",
        body: "Tu pedido #{{order_id}} esta en camino. Paqueteria: {{carrier}}, \
               numero de guia: {{tracking_number}}.",
        variables: &["order_id", "carrier", "tracking_number"],
    },
    Seed {
        name: "order_delivered",
        language: "en",
        body: "Good news! Your order #{{order_id}} was delivered on {{delivery_date}}. \
               Thank you for shopping with us.",
        variables: &["order_id", "delivery_date"],
    },
    Seed {
        name: "order_delivered",
        language: "es",
        body: "Buenas noticias! Tu pedido #{{order_id}} fue entregado el {{delivery_date}}. \
               Gracias por tu compra.",
        variables: &["order_id", "delivery_date"],
    },
    Seed {
        name: "order_cancelled",
        language: "en",
        body: "Your order #{{order_id}} has been cancelled. Reason: {{reason}}. \
               Contact us if you have any questions.",
        variables: &["order_id", "reason"],
    },
    Seed {
        name: "order_cancelled",
        language: "es",
        body: "Tu pedido #{{order_id}} ha sido cancelado. Motivo: {{reason}}. \
               Contactanos si tienes alguna duda.",
        variables: &["order_id", "reason"],
    },
    Seed {
        name: "payment_confirmed",
        language: "en",
        body: "Payment received for order #{{order_id}}: {{amount}} via {{payment_method}}. \
               Your order is now being prepared.",
        variables: &["order_id", "amount", "payment_method"],
    },
    Seed {
        name: "payment_confirmed",
        language: "es",
        body: "Pago recibido para el pedido #{{order_id}}: {{amount}} via {{payment_method}}. \
               Tu pedido esta siendo preparado.",
        variables: &["order_id", "amount", "payment_method"],
    },
];

/// The built-in template set, covering the standard order lifecycle in
/// English and Spanish.
pub fn default_templates() -> Vec<Template> {
    let now = Utc::now();
    SEEDS
        .iter()
        .map(|seed| Template {
            name: seed.name.to_string(),
            language: seed.language.to_string(),
            body: seed.body.to_string(),
            variables: seed.variables.iter().map(|v| v.to_string()).collect(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates_are_valid() {
        let templates = default_templates();
        assert_eq!(templates.len(), 10);

        for template in &templates {
            template.validate().unwrap();
        }
    }

    #[test]
    fn test_default_templates_cover_both_languages() {
        let templates = default_templates();

        for name in [
            "order_confirmation",
            "order_shipped",
            "order_delivered",
            "order_cancelled",
            "payment_confirmed",
        ] {
            for language in ["en", "es"] {
                assert!(
                    templates
                        .iter()
                        .any(|t| t.name == name && t.language == language),
                    "missing {} ({})",
                    name,
                    language
                );
            }
        }
    }
}
