use serde::Deserialize;
use serde_json::Value;

use crate::domain::address::Address as DomainAddress;

#[derive(Debug, Deserialize)]
/// Body returned by the ViaCEP lookup endpoint.
pub struct ViaCepResponse {
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default)]
    pub localidade: String,
    #[serde(default)]
    pub uf: String,
    /// Present (as `true` or `"true"`) when the postal code is unknown.
    #[serde(default)]
    pub erro: Option<Value>,
}

impl ViaCepResponse {
    pub fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag == "true",
            _ => false,
        }
    }
}

impl From<ViaCepResponse> for DomainAddress {
    fn from(body: ViaCepResponse) -> Self {
        Self {
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            uf: body.uf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_flag_accepts_bool_and_string() {
        let body: ViaCepResponse = serde_json::from_value(json!({"erro": true})).unwrap();
        assert!(body.is_not_found());
        let body: ViaCepResponse = serde_json::from_value(json!({"erro": "true"})).unwrap();
        assert!(body.is_not_found());
    }

    #[test]
    fn found_address_maps_fields() {
        let body: ViaCepResponse = serde_json::from_value(json!({
            "cep": "01310-100",
            "logradouro": "Avenida Paulista",
            "bairro": "Bela Vista",
            "localidade": "São Paulo",
            "uf": "SP"
        }))
        .unwrap();
        assert!(!body.is_not_found());

        let address = DomainAddress::from(body);
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.street, "Avenida Paulista");
    }
}
