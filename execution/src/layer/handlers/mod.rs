mod table;
mod treasury;
mod wager;
