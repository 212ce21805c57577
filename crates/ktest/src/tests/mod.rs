mod dump;
mod file;
