//! Simulador de mercado por produto constante, sem taxas.
//!
//! O modelo é fechado e determinístico, desacoplado dos saldos on-chain:
//! o orquestrador reconcilia os montantes simulados com as transferências
//! reais e trata divergência como aviso. Toda a matemática de swap é
//! inteira com divisão truncada; ponto flutuante aparece apenas no
//! percentual de impacto de preço reportado.

use relayrace_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sentido de um swap na pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Entrega X, recebe Y
    XForY,
    /// Entrega Y, recebe X
    YForX,
}

/// Cota um swap: `floor(input * output_reserve / (input_reserve + input))`.
///
/// Monotônico no input para reservas positivas e nunca excede a reserva
/// de saída.
pub fn quote_swap(input: u128, input_reserve: u128, output_reserve: u128) -> Result<u128> {
    if input == 0 {
        return Err(Error::ValidationError(
            "montante de entrada do swap deve ser positivo".to_string(),
        ));
    }
    if input_reserve == 0 || output_reserve == 0 {
        return Err(Error::ValidationError(
            "reservas da pool não podem ser zero".to_string(),
        ));
    }

    let numerator = input
        .checked_mul(output_reserve)
        .ok_or_else(|| Error::ArithmeticError("estouro no numerador do swap".to_string()))?;
    let denominator = input_reserve
        .checked_add(input)
        .ok_or_else(|| Error::ArithmeticError("estouro no denominador do swap".to_string()))?;

    Ok(numerator / denominator)
}

/// Impacto de preço percentual de um trade simulado, sem aplicá-lo.
///
/// Preço marginal pré-trade = output_reserve / input_reserve; o pós-trade
/// vem das reservas após uma aplicação não-comprometida do mesmo swap.
pub fn price_impact(input: u128, input_reserve: u128, output_reserve: u128) -> Result<f64> {
    if input_reserve == 0 || output_reserve == 0 {
        return Err(Error::ValidationError(
            "reservas da pool não podem ser zero".to_string(),
        ));
    }

    let output = quote_swap(input, input_reserve, output_reserve)?;
    let pre = output_reserve as f64 / input_reserve as f64;
    let post = (output_reserve - output) as f64 / (input_reserve + input) as f64;

    Ok((pre - post) / pre * 100.0)
}

/// Pool de liquidez com duas reservas inteiras e produto `k`.
///
/// Sem taxas, o produto recomputado após cada swap fica exatamente igual;
/// uma queda de `k` indica bug aritmético e é rejeitada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    reserve_x: u128,
    reserve_y: u128,
    k: u128,
}

impl Pool {
    pub fn new(reserve_x: u128, reserve_y: u128) -> Result<Self> {
        let k = reserve_x
            .checked_mul(reserve_y)
            .ok_or_else(|| Error::ArithmeticError("estouro no produto inicial da pool".to_string()))?;
        Ok(Self { reserve_x, reserve_y, k })
    }

    pub fn reserve_x(&self) -> u128 {
        self.reserve_x
    }

    pub fn reserve_y(&self) -> u128 {
        self.reserve_y
    }

    pub fn k(&self) -> u128 {
        self.k
    }

    /// Aplica um swap: cota, move as reservas pelos montantes exatos e
    /// recomputa `k`. Falha com `InsufficientReserve` quando a saída
    /// drenaria a reserva a zero ou abaixo.
    pub fn apply_swap(&mut self, direction: SwapDirection, input: u128) -> Result<u128> {
        let (input_reserve, output_reserve) = match direction {
            SwapDirection::XForY => (self.reserve_x, self.reserve_y),
            SwapDirection::YForX => (self.reserve_y, self.reserve_x),
        };

        let output = quote_swap(input, input_reserve, output_reserve)?;
        if output >= output_reserve {
            return Err(Error::InsufficientReserve(format!(
                "saída {} drenaria a reserva {}",
                output, output_reserve
            )));
        }

        let previous_k = self.k;
        match direction {
            SwapDirection::XForY => {
                self.reserve_x += input;
                self.reserve_y -= output;
            }
            SwapDirection::YForX => {
                self.reserve_y += input;
                self.reserve_x -= output;
            }
        }

        self.k = self
            .reserve_x
            .checked_mul(self.reserve_y)
            .ok_or_else(|| Error::ArithmeticError("estouro ao recomputar o produto da pool".to_string()))?;

        // Invariante do produto constante sem taxas: k nunca diminui
        if self.k < previous_k {
            return Err(Error::ArithmeticError(format!(
                "produto da pool diminuiu de {} para {}",
                previous_k, self.k
            )));
        }

        debug!(
            direction = ?direction,
            input,
            output,
            reserve_x = self.reserve_x,
            reserve_y = self.reserve_y,
            k = self.k,
            "swap aplicado"
        );

        Ok(output)
    }
}
