//! Token whitelist registry.
//!
//! Records which symbols are whitelisted, the token reference behind each,
//! and the ordered list of counter-symbols each may be traded against.
//! A symbol is bound to exactly one reference for its whole lifetime; the
//! only later mutation is appending new pair symbols.

use std::collections::HashMap;

use dax_types::{DaxError, Result, Symbol, TokenAddress};

/// A whitelisted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    pub symbol: Symbol,
    pub token: TokenAddress,
    /// Counter-symbols, in registration order.
    pub pairs: Vec<Symbol>,
}

/// Registry of whitelisted tokens and their trading pairs.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: HashMap<Symbol, TokenEntry>,
    by_address: HashMap<TokenAddress, Symbol>,
}

impl TokenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitelist `symbol` backed by `token`, tradeable against each of
    /// `pair_symbols`.
    ///
    /// Pair symbols are registered with their references as well so they
    /// can be deposited. Re-whitelisting a symbol with the same reference
    /// appends any new pair symbols and ignores ones already present.
    ///
    /// Every binding is validated before anything is written.
    ///
    /// # Errors
    /// - `InvalidPairLengthMismatch` if the two slices differ in length
    /// - `InvalidPair` if `symbol` lists itself as a pair
    /// - `AlreadyWhitelisted` if any symbol or reference is already bound
    ///   to something else
    pub fn whitelist(
        &mut self,
        symbol: Symbol,
        token: TokenAddress,
        pair_symbols: &[Symbol],
        pair_refs: &[TokenAddress],
    ) -> Result<&TokenEntry> {
        if pair_symbols.len() != pair_refs.len() {
            return Err(DaxError::InvalidPairLengthMismatch {
                symbols: pair_symbols.len(),
                refs: pair_refs.len(),
            });
        }
        if let Some(own) = pair_symbols.iter().find(|p| **p == symbol) {
            return Err(DaxError::InvalidPair {
                first: symbol,
                second: *own,
            });
        }

        // Staged bindings from this call, checked against each other and
        // against the registry.
        let mut staged: HashMap<Symbol, TokenAddress> = HashMap::new();
        let mut staged_by_address: HashMap<TokenAddress, Symbol> = HashMap::new();
        let bindings = std::iter::once((symbol, token))
            .chain(pair_symbols.iter().copied().zip(pair_refs.iter().copied()));
        for (sym, addr) in bindings {
            self.check_binding(sym, addr)?;
            if staged.get(&sym).is_some_and(|a| *a != addr)
                || staged_by_address.get(&addr).is_some_and(|s| *s != sym)
            {
                return Err(DaxError::AlreadyWhitelisted { symbol: sym });
            }
            staged.insert(sym, addr);
            staged_by_address.insert(addr, sym);
        }

        for (sym, addr) in pair_symbols.iter().zip(pair_refs) {
            self.bind(*sym, *addr);
        }
        self.bind(symbol, token);

        let entry = self
            .tokens
            .get_mut(&symbol)
            .ok_or_else(|| DaxError::Internal(format!("{symbol} missing after bind")))?;
        for pair in pair_symbols {
            if !entry.pairs.contains(pair) {
                entry.pairs.push(*pair);
            }
        }

        tracing::debug!(
            symbol = %symbol,
            token = %token,
            pairs = entry.pairs.len(),
            "Token whitelisted"
        );
        Ok(&*entry)
    }

    fn check_binding(&self, symbol: Symbol, token: TokenAddress) -> Result<()> {
        if self.tokens.get(&symbol).is_some_and(|e| e.token != token) {
            return Err(DaxError::AlreadyWhitelisted { symbol });
        }
        match self.by_address.get(&token) {
            Some(bound) if *bound != symbol => Err(DaxError::AlreadyWhitelisted { symbol: *bound }),
            _ => Ok(()),
        }
    }

    fn bind(&mut self, symbol: Symbol, token: TokenAddress) {
        self.tokens.entry(symbol).or_insert_with(|| TokenEntry {
            symbol,
            token,
            pairs: Vec::new(),
        });
        self.by_address.insert(token, symbol);
    }

    #[must_use]
    pub fn is_whitelisted(&self, symbol: &Symbol) -> bool {
        self.tokens.contains_key(symbol)
    }

    #[must_use]
    pub fn is_address_whitelisted(&self, token: &TokenAddress) -> bool {
        self.by_address.contains_key(token)
    }

    /// The symbol bound to a token reference.
    #[must_use]
    pub fn symbol_of(&self, token: &TokenAddress) -> Option<Symbol> {
        self.by_address.get(token).copied()
    }

    #[must_use]
    pub fn token(&self, symbol: &Symbol) -> Option<&TokenEntry> {
        self.tokens.get(symbol)
    }

    /// Counter-symbols for `symbol`, in registration order. Empty if the
    /// symbol is unknown.
    #[must_use]
    pub fn get_pairs(&self, symbol: &Symbol) -> &[Symbol] {
        self.tokens
            .get(symbol)
            .map(|entry| entry.pairs.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `first` may be traded against `second` as the quote asset.
    #[must_use]
    pub fn is_valid_pair(&self, first: &Symbol, second: &Symbol) -> bool {
        self.get_pairs(first).contains(second) && self.is_whitelisted(second)
    }

    /// Fail with `NotWhitelisted` / `InvalidPair` unless the pair may trade.
    pub fn ensure_pair(&self, first: &Symbol, second: &Symbol) -> Result<()> {
        for sym in [first, second] {
            if !self.is_whitelisted(sym) {
                return Err(DaxError::NotWhitelisted(*sym));
            }
        }
        if !self.is_valid_pair(first, second) {
            return Err(DaxError::InvalidPair {
                first: *first,
                second: *second,
            });
        }
        Ok(())
    }

    /// Number of whitelisted symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
