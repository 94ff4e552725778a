mod concurrency;
mod guards;
mod order_graph;
