// Alert message composition

/// Render the missed-appointment alert for one record
pub fn compose(name: &str, address: &str) -> String {
    format!(
        "Gestante: *{}*\nEndereço: *{}*\n\nNão compareceu à consulta, verifique, por favor.",
        name, address
    )
}
