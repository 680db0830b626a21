pub type Error = String;
