use chrono::NaiveDate;
use thiserror::Error;

// Violações de regra de negócio: esperadas, recuperáveis, e a mensagem
// vai literalmente para o usuário final. A camada web NÃO deve tratá-las
// como erro interno.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("a região {region} já possui {current} de {max} entregas permitidas em {date}")]
    RegionQuotaExceeded {
        region: String,
        date: NaiveDate,
        current: i64,
        max: i32,
    },

    #[error(
        "não há minutos suficientes na rota de {date}: {used} já ocupados + {requested} solicitados excede o limite de {budget} minutos"
    )]
    TimeBudgetExceeded {
        date: NaiveDate,
        used: i64,
        requested: i64,
        budget: i64,
    },

    #[error("número máximo de {max} paradas atingido para a rota de {date}")]
    StopLimitReached { date: NaiveDate, max: i32 },

    #[error("nenhum motorista disponível em {date}")]
    NoDriverAvailable { date: NaiveDate },

    #[error("sem caminhões para atender uma nova região em {date}: {active} rotas ativas para {trucks} caminhões")]
    TruckFleetExhausted {
        date: NaiveDate,
        active: i64,
        trucks: i64,
    },

    #[error("o endereço está fora de todas as regiões de entrega")]
    OutsideDeliveryRegions,

    #[error("não é possível agendar para uma data no passado: {0}")]
    DateInPast(NaiveDate),

    #[error("informe uma região ou as coordenadas do endereço")]
    MissingRegion,
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    // A mensagem da violação sobe intacta até o usuário.
    #[error("{0}")]
    BusinessRule(#[from] RuleViolation),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Registro não encontrado: {0}")]
    NotFound(&'static str),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Falha no serviço de geocodificação: {0}")]
    GeocodingError(String),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Separa as duas classes de erro: a camada chamadora exibe regras de
    /// negócio como mensagem ao usuário e trata o resto como falha genérica.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            AppError::BusinessRule(_) | AppError::ValidationError(_) | AppError::NotFound(_)
        )
    }

    pub fn as_rule_violation(&self) -> Option<&RuleViolation> {
        match self {
            AppError::BusinessRule(v) => Some(v),
            _ => None,
        }
    }
}
