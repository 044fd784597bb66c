// src/models/auth.rs

use sha2::{Digest, Sha256};

// Token do usuário autenticado, repassado como está para a API WBR.
// O backend WBR é quem valida o token; aqui ele só identifica a sessão.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(pub String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    // Valor do cabeçalho Authorization no formato do Django REST Framework
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }

    /// SHA-256 (hex) do token. Usado como chave de sessões e de filtros
    /// salvos, para nunca guardar o token em claro.
    pub fn fingerprint(&self) -> String {
        format!("{:x}", Sha256::digest(self.0.as_bytes()))
    }
}

// Nunca imprime o token em logs
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthToken(***)")
    }
}
