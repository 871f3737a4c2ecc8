/// Decides which configured player opens each simulated game.
pub struct OpeningOrder {
    alternate: bool,
}

impl OpeningOrder {
    pub fn new(alternate: bool) -> Self {
        Self { alternate }
    }

    /// Player indices in seat order for game `game_index`; the first seat opens.
    pub fn seats(&self, game_index: usize) -> [usize; 2] {
        if self.alternate && game_index % 2 == 1 {
            [1, 0]
        } else {
            [0, 1]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_the_opener() {
        let order = OpeningOrder::new(true);
        assert_eq!(order.seats(0), [0, 1]);
        assert_eq!(order.seats(1), [1, 0]);
        assert_eq!(order.seats(2), [0, 1]);
    }

    #[test]
    fn fixed_order_keeps_first_player() {
        let order = OpeningOrder::new(false);
        assert!((0..5).all(|index| order.seats(index) == [0, 1]));
    }
}
