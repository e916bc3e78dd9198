use thiserror::Error;

/// Erros comuns da biblioteca Relayrace
#[derive(Error, Debug)]
pub enum Error {
    /// Erro de comunicação com o node ou com o relayer
    #[error("Erro de gateway: {0}")]
    GatewayError(String),

    /// Erro de decodificação de dados
    #[error("Erro de decodificação: {0}")]
    DecodeError(String),

    /// Erro de validação
    #[error("Erro de validação: {0}")]
    ValidationError(String),

    /// Erro de configuração
    #[error("Erro de configuração: {0}")]
    ConfigError(String),

    /// Reserva insuficiente na pool para o swap pedido
    #[error("Reserva insuficiente: {0}")]
    InsufficientReserve(String),

    /// Estouro ou inconsistência aritmética
    #[error("Erro aritmético: {0}")]
    ArithmeticError(String),

    /// Erro de timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Recurso não encontrado
    #[error("Não encontrado: {0}")]
    NotFound(String),

    /// Erro genérico
    #[error("{0}")]
    Other(String),
}

/// Tipo de resultado usado em toda a biblioteca
pub type Result<T> = std::result::Result<T, Error>;
