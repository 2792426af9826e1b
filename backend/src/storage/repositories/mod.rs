//! One repository per table; raw parameterized sqlx queries.

pub mod categoria_repository;
pub mod contribuicao_repository;
pub mod entrada_repository;
pub mod saida_repository;
pub mod token_repository;
pub mod visitante_repository;

pub use categoria_repository::CategoriaRepository;
pub use contribuicao_repository::ContribuicaoRepository;
pub use entrada_repository::EntradaRepository;
pub use saida_repository::SaidaRepository;
pub use token_repository::TokenRepository;
pub use visitante_repository::VisitanteRepository;
